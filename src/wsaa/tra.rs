use chrono::{DateTime, Duration, FixedOffset};

/// Seconds the generation time is backdated; WSAA rejects requests generated
/// in its future.
pub const CLOCK_SKEW_SECS: i64 = 120;

/// Requested ticket lifetime.
pub const TICKET_LIFETIME_SECS: i64 = 12 * 60 * 60;

const TIME_FORMAT: &str = "%FT%T%:z";

/// Build the `loginTicketRequest` (TRA) document for `service` as of `now`.
///
/// `uniqueId` is the epoch second of the generation time, so two requests in
/// the same second collide; WSAA rejects the second one.
pub fn build_tra(now: DateTime<FixedOffset>, service: &str) -> String {
    let from = now - Duration::seconds(CLOCK_SKEW_SECS);
    let to = from + Duration::seconds(TICKET_LIFETIME_SECS);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<loginTicketRequest version="1.0">
  <header>
    <uniqueId>{id}</uniqueId>
    <generationTime>{from}</generationTime>
    <expirationTime>{to}</expirationTime>
  </header>
  <service>{service}</service>
</loginTicketRequest>
"#,
        id = from.timestamp(),
        from = from.format(TIME_FORMAT),
        to = to.format(TIME_FORMAT),
    )
}
