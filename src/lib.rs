// Module layout (Clean Architecture style)
// - bootstrap: configuration and wiring
// - infrastructure: index persistence / HTTP transport / filesystem adapters
// - application: ports, pure services, and sync use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
