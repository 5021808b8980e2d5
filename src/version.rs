/// Version string returned by the Version command. Clients probe for a
/// memcached release number, so a real one is reported instead of the
/// crate version.
pub const ADVERTISED_VERSION: &str = "1.4.24";
