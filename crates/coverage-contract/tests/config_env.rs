use coverage_contract::config::loader::load_config;
use std::io::Write;

#[test]
fn test_environment_overrides_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[event_bus]\nclient_name = \"from-file\"").unwrap();

    // SAFETY: the only test in this binary, so no other thread reads the environment
    unsafe {
        std::env::set_var("COVERAGE__EVENT_BUS__CLIENT_NAME", "from-env");
        std::env::set_var("COVERAGE__EVENT_BUS__CONNECT_TIMEOUT_MS", "750");
    }
    let result = load_config(file.path().to_str());
    unsafe {
        std::env::remove_var("COVERAGE__EVENT_BUS__CLIENT_NAME");
        std::env::remove_var("COVERAGE__EVENT_BUS__CONNECT_TIMEOUT_MS");
    }

    let cfg = result.unwrap();
    assert_eq!(cfg.event_bus.client_name, "from-env");
    assert_eq!(cfg.event_bus.connect_timeout_ms, 750);
}
