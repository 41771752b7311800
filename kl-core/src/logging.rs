// Diagnostics go to stderr so that stdout stays reserved for the emitted log
// records; `json` switches the formatter to match the record output format.
pub fn setup(env_filter: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
