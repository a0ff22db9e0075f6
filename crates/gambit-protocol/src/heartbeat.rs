//! Heart-beat negotiation.
//!
//! Each side announces `cx,cy` in its handshake frame: "I can send a
//! heartbeat every `cx` ms" and "I want one from you every `cy` ms". Zero
//! means "cannot" / "do not want". The effective interval in each direction
//! is the larger of what the sender offers and what the receiver asks for,
//! or zero when either side opts out.

use std::time::Duration;

use crate::ProtocolError;

/// A pair of heart-beat intervals, in the orientation of whoever owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// How often we send (or the peer offers to send).
    pub outgoing: Duration,
    /// How often we expect traffic (or the peer expects it).
    pub incoming: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            outgoing: Duration::from_millis(4000),
            incoming: Duration::from_millis(4000),
        }
    }
}

impl Heartbeat {
    /// No heartbeats either way.
    pub const DISABLED: Self = Self {
        outgoing: Duration::ZERO,
        incoming: Duration::ZERO,
    };

    pub fn new(outgoing: Duration, incoming: Duration) -> Self {
        Self { outgoing, incoming }
    }

    /// Parses a `heart-beat` header value (`"4000,4000"`).
    ///
    /// # Errors
    /// [`ProtocolError::InvalidHeartbeat`] if the value is not two
    /// comma-separated non-negative integers.
    pub fn parse(header: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidHeartbeat(header.to_string());
        let (x, y) = header.split_once(',').ok_or_else(invalid)?;
        let x: u64 = x.trim().parse().map_err(|_| invalid())?;
        let y: u64 = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(Duration::from_millis(x), Duration::from_millis(y)))
    }

    /// Formats the value for a `heart-beat` header.
    pub fn to_header(&self) -> String {
        format!("{},{}", self.outgoing.as_millis(), self.incoming.as_millis())
    }

    /// Combines our offer with the server's `heart-beat` header.
    ///
    /// The result is in our orientation: `outgoing` is how often we must
    /// send, `incoming` how often the server promised to send. A missing
    /// server header means the server does no heart-beating.
    pub fn negotiate(&self, server: Option<Heartbeat>) -> Heartbeat {
        let server = server.unwrap_or(Self::DISABLED);
        Heartbeat {
            outgoing: effective(self.outgoing, server.incoming),
            incoming: effective(server.outgoing, self.incoming),
        }
    }
}

fn effective(offered: Duration, wanted: Duration) -> Duration {
    if offered.is_zero() || wanted.is_zero() {
        Duration::ZERO
    } else {
        offered.max(wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_offers_four_seconds_each_way() {
        assert_eq!(Heartbeat::default().to_header(), "4000,4000");
    }

    #[test]
    fn test_parse_valid_header() {
        let hb = Heartbeat::parse("10000, 0").unwrap();
        assert_eq!(hb, Heartbeat::new(ms(10_000), Duration::ZERO));
    }

    #[test]
    fn test_parse_garbage_returns_invalid_heartbeat() {
        for bad in ["", "4000", "a,b", "-1,0"] {
            assert!(
                matches!(Heartbeat::parse(bad), Err(ProtocolError::InvalidHeartbeat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_negotiate_takes_larger_interval() {
        let ours = Heartbeat::default();
        let server = Heartbeat::new(ms(10_000), ms(2_000));
        let agreed = ours.negotiate(Some(server));
        assert_eq!(agreed.outgoing, ms(4_000));
        assert_eq!(agreed.incoming, ms(10_000));
    }

    #[test]
    fn test_negotiate_zero_on_either_side_disables_direction() {
        let ours = Heartbeat::new(ms(4_000), Duration::ZERO);
        let agreed = ours.negotiate(Some(Heartbeat::new(ms(5_000), ms(5_000))));
        assert_eq!(agreed.outgoing, ms(5_000));
        assert!(agreed.incoming.is_zero());
    }

    #[test]
    fn test_negotiate_missing_server_header_disables_both() {
        assert_eq!(Heartbeat::default().negotiate(None), Heartbeat::DISABLED);
    }
}
