use std::net::SocketAddr;
use std::sync::{
    Arc,
    Mutex,
};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{
    AsyncBufReadExt,
    AsyncWriteExt,
    BufReader,
};
use tokio::net::{
    TcpListener,
    TcpStream,
};
use tokio_util::sync::CancellationToken;

// httpmock answers a request and closes it; watch and log streams need
// responses whose bodies stay open until the test says otherwise.  This is a
// minimal HTTP/1.1 server that serves canned bodies per path and can then
// hold the connection open (watch semantics), close it cleanly (EOF), or
// abort it (a transient read error on the client side).
#[derive(Clone)]
struct Route {
    path: String,
    status: u16,
    body: Bytes,
    hold: Option<CancellationToken>,
    reset: bool,
}

pub struct StreamServer {
    addr: SocketAddr,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: CancellationToken,
}

impl StreamServer {
    pub async fn start() -> StreamServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<Vec<Route>>> = Arc::default();
        let requests: Arc<Mutex<Vec<String>>> = Arc::default();
        let shutdown = CancellationToken::new();

        let accept_routes = routes.clone();
        let accept_requests = requests.clone();
        let accept_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                let conn = tokio::select! {
                    _ = accept_shutdown.cancelled() => break,
                    res = listener.accept() => match res {
                        Ok((conn, _)) => conn,
                        Err(_) => break,
                    },
                };
                tokio::spawn(serve_connection(
                    conn,
                    accept_routes.clone(),
                    accept_requests.clone(),
                    accept_shutdown.clone(),
                ));
            }
        });

        StreamServer { addr, routes, requests, shutdown }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    // Responds and closes the connection right after the body (clean EOF)
    pub fn serve(&self, path: &str, status: u16, body: impl Into<Bytes>) {
        self.push(path, status, body.into(), None, false);
    }

    // Responds, then keeps the connection open until the returned token is
    // cancelled or the server shuts down
    pub fn serve_held(&self, path: &str, status: u16, body: impl Into<Bytes>) -> CancellationToken {
        let gate = CancellationToken::new();
        self.push(path, status, body.into(), Some(gate.clone()), false);
        gate
    }

    // Responds, then aborts the connection so the client observes a read
    // error instead of EOF
    pub fn serve_reset(&self, path: &str, status: u16, body: impl Into<Bytes>) {
        self.push(path, status, body.into(), None, true);
    }

    // Request targets (path?query) in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, path: &str, status: u16, body: Bytes, hold: Option<CancellationToken>, reset: bool) {
        self.routes.lock().unwrap().push(Route { path: path.into(), status, body, hold, reset });
    }
}

impl Drop for StreamServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn serve_connection(
    conn: TcpStream,
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: CancellationToken,
) {
    let (read_half, mut write_half) = conn.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let request_line = match lines.next_line().await {
        Ok(Some(line)) => line,
        _ => return,
    };
    let target = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.is_empty() {
            break;
        }
    }
    requests.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or("");
    let route = routes.lock().unwrap().iter().find(|r| r.path == path).cloned();
    let Some(route) = route else {
        let _ = write_half
            .write_all(b"HTTP/1.1 404 Not Found\r\nConnection: close\r\nContent-Length: 0\r\n\r\n")
            .await;
        return;
    };

    let head = format!("HTTP/1.1 {} {}\r\nConnection: close\r\n\r\n", route.status, reason(route.status));
    if write_half.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    if write_half.write_all(&route.body).await.is_err() {
        return;
    }
    let _ = write_half.flush().await;

    if route.reset {
        // Let the client drain what was sent, then abort the socket so its
        // next read fails with a connection reset
        tokio::time::sleep(Duration::from_millis(200)).await;
        let read_half = lines.into_inner().into_inner();
        if let Ok(stream) = read_half.reunite(write_half) {
            let _ = stream.set_linger(Some(Duration::ZERO));
        }
        return;
    }

    if let Some(gate) = route.hold {
        tokio::select! {
            _ = gate.cancelled() => {},
            _ = shutdown.cancelled() => {},
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}
