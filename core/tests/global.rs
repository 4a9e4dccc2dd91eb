//! The process-wide gateway. Kept in its own test binary because it reads
//! and pins process environment.

use portal_gateway::{GatewayConfig, HttpRequestGateway};

#[test]
fn global_is_built_once_from_env() {
    std::env::set_var("PORTAL_API_URL", "http://portal.internal:8080/");

    let first = portal_gateway::global().unwrap();
    assert_eq!(first.base_url(), "http://portal.internal:8080");

    // Later environment changes are not picked up.
    std::env::set_var("PORTAL_API_URL", "http://elsewhere:9090");
    let second = portal_gateway::global().unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(second.base_url(), "http://portal.internal:8080");

    // Token state is shared by every user of the global instance.
    first.set_auth_token("t");
    assert_eq!(second.auth_token().as_deref(), Some("t"));

    let replacement = HttpRequestGateway::from_config(&GatewayConfig::default()).unwrap();
    assert!(portal_gateway::install_global(replacement).is_err());
}
