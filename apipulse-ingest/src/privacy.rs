//! Privacy-tier redaction, applied once per event before persistence.

use crate::geoip::CountryResolver;
use apipulse_core::{PrivacyLevel, RequestData};

/// Redact `event` in place according to `level` and return the resolved
/// location.
///
/// Inference must read the original IP before redaction clears it: P1 and P2
/// infer the country code first; P2 and P3 then discard the IP. After this
/// returns for P2/P3, the original IP no longer exists anywhere on the
/// event's path to storage. Calling it again on an already-redacted event is
/// a no-op.
pub fn redact(event: &mut RequestData, level: PrivacyLevel, resolver: &dyn CountryResolver) -> String {
    let location = if level < PrivacyLevel::P3 {
        resolver.country_code(&event.ip_address)
    } else {
        String::new()
    };

    if level > PrivacyLevel::P1 {
        event.ip_address.clear();
    }

    location
}
