pub mod http_relay;
pub mod reqwest_transport;
