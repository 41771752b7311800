use httpmock::prelude::*;
use httpmock::{
    Mock,
    Then,
    When,
};

// Thin wrapper around httpmock for the request/response halves of the agent
// that don't need a held-open body: status rejections, finite watch bodies
// that should EOF immediately, and query-parameter assertions.  Streams that
// must stay open across the test live in `stream_server`.
pub struct MockServerBuilder {
    server: MockServer,
    mock_ids: Vec<(usize, usize)>,
}

impl MockServerBuilder {
    pub fn new() -> MockServerBuilder {
        MockServerBuilder { server: MockServer::start(), mock_ids: vec![] }
    }

    pub fn assert(&self) {
        for (id, calls) in &self.mock_ids {
            Mock::new(*id, &self.server).assert_hits(*calls)
        }
    }

    pub fn handle<F: Fn(When, Then) + 'static>(&mut self, f: F) -> usize {
        self.handle_multiple(f, 1)
    }

    pub fn handle_multiple<F: Fn(When, Then) + 'static>(&mut self, f: F, calls: usize) -> usize {
        let mock_id = self.server.mock(f).id;
        self.mock_ids.push((mock_id, calls));
        mock_id
    }

    pub fn url(&self) -> reqwest::Url {
        reqwest::Url::parse(&self.server.url("/")).unwrap()
    }
}
