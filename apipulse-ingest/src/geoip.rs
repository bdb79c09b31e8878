use maxminddb::geoip2;
use std::net::IpAddr;
use std::path::Path;
use tracing::{info, warn};

/// Country inference from a client IP string.
///
/// Every failure mode (bad IP syntax, lookup miss, missing database)
/// resolves to an empty code. Location is best-effort metadata and must
/// never block an event.
pub trait CountryResolver: Send + Sync {
    /// ISO 3166-1 country code for the IP, or `""`.
    fn country_code(&self, ip: &str) -> String;
}

/// Production resolver backed by a local MaxMind GeoLite2 country database.
pub struct GeoIpResolver {
    reader: Option<maxminddb::Reader<Vec<u8>>>,
}

impl GeoIpResolver {
    /// Open the database at `path`. A missing or unreadable file degrades to
    /// a resolver that answers `""` for everything.
    pub fn open(path: &Path) -> Self {
        match maxminddb::Reader::open_readfile(path) {
            Ok(reader) => {
                info!(path = %path.display(), "GeoIP database loaded");
                Self { reader: Some(reader) }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "GeoIP database unavailable, locations will be empty");
                Self { reader: None }
            }
        }
    }

    /// A resolver with no database. Used when location inference is off.
    pub fn disabled() -> Self {
        Self { reader: None }
    }
}

impl CountryResolver for GeoIpResolver {
    fn country_code(&self, ip: &str) -> String {
        let Some(reader) = &self.reader else {
            return String::new();
        };
        let Ok(addr) = ip.parse::<IpAddr>() else {
            return String::new();
        };
        match reader.lookup::<geoip2::Country>(addr) {
            Ok(record) => record
                .country
                .and_then(|c| c.iso_code)
                .map(str::to_owned)
                .unwrap_or_default(),
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_resolver_answers_empty_for_everything() {
        let resolver = GeoIpResolver::disabled();
        assert_eq!(resolver.country_code("8.8.8.8"), "");
        assert_eq!(resolver.country_code("2001:4860:4860::8888"), "");
        assert_eq!(resolver.country_code(""), "");
        assert_eq!(resolver.country_code("not-an-ip"), "");
    }

    #[test]
    fn missing_database_file_degrades_instead_of_failing() {
        let resolver = GeoIpResolver::open(Path::new("/nonexistent/GeoLite2-Country.mmdb"));
        assert_eq!(resolver.country_code("8.8.8.8"), "");
    }
}
