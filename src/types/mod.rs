//! PTPv2 wire primitives.
//!
//! Fixed-width field types shared by every PTP message: timestamps,
//! scaled-nanosecond intervals, clock and port identities, length-prefixed
//! text, and the clock-quality vocabulary. All multi-byte integers are
//! big-endian on the wire.

use std::net::IpAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};


/// Header `flagField` bits.
///
/// The flag field is carried as a big-endian `u16`; constants here are the
/// in-memory values after decoding.
pub mod flags {
    /// Last minute of the current UTC day contains 61 seconds.
    pub const LEAP61: u16 = 0x0001;
    /// Last minute of the current UTC day contains 59 seconds.
    pub const LEAP59: u16 = 0x0002;
    /// `currentUtcOffset` is known to be correct.
    pub const CURRENT_UTC_OFFSET_VALID: u16 = 0x0004;
    /// The timescale of the grandmaster is PTP (TAI).
    pub const PTP_TIMESCALE: u16 = 0x0008;
    /// The time is traceable to a primary reference.
    pub const TIME_TRACEABLE: u16 = 0x0010;
    /// The frequency is traceable to a primary reference.
    pub const FREQUENCY_TRACEABLE: u16 = 0x0020;
    /// Alternate-master dissemination.
    pub const ALTERNATE_MASTER: u16 = 0x0100;
    /// A `Follow_Up` with the precise origin timestamp will follow.
    pub const TWO_STEP: u16 = 0x0200;
    /// The message was sent point-to-point rather than multicast.
    pub const UNICAST: u16 = 0x0400;
    /// Profile-specific bit 1.
    pub const PROFILE_SPECIFIC_1: u16 = 0x2000;
    /// Profile-specific bit 2.
    pub const PROFILE_SPECIFIC_2: u16 = 0x4000;
}

// --- TimeInterval / Correction ---

/// Scaled-nanosecond interval: nanoseconds multiplied by 2^16, signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeInterval(i64);

impl TimeInterval {
    /// Create from a nanosecond value, rounding to the nearest 2^-16 ns.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Intervals of interest are far below the i64/2^16 bound"
    )]
    pub fn from_nanos(nanos: f64) -> Self {
        Self((nanos * 65536.0).round() as i64)
    }

    /// Wrap a raw wire value.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw wire value (ns × 2^16).
    #[must_use]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// The interval in nanoseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn nanos(self) -> f64 {
        self.0 as f64 / 65536.0
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}ns", self.nanos())
    }
}

/// Accumulated residence-time correction, same 2^16 fixed point as
/// [`TimeInterval`] but with a saturation sentinel.
///
/// The all-bits-set-except-sign value means the correction was too large to
/// represent. It reads back as +∞ nanoseconds and contributes nothing to
/// timestamp arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Correction(i64);

impl Correction {
    /// The "too big to represent" sentinel.
    pub const TOO_BIG: Self = Self(0x7FFF_FFFF_FFFF_FFFF);

    /// Create from a nanosecond value, saturating to [`Self::TOO_BIG`] when
    /// the scaled value does not fit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_nanos(nanos: f64) -> Self {
        let scaled = nanos * 65536.0;
        if scaled.abs() >= Self::TOO_BIG.0 as f64 {
            return Self::TOO_BIG;
        }
        Self(scaled.round() as i64)
    }

    /// Wrap a raw wire value.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    #[must_use]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Whether this is the saturation sentinel.
    #[must_use]
    pub fn too_big(self) -> bool {
        self.0 == Self::TOO_BIG.0
    }

    /// The correction in nanoseconds; +∞ for the sentinel.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn nanos(self) -> f64 {
        if self.too_big() {
            return f64::INFINITY;
        }
        self.0 as f64 / 65536.0
    }

    /// Whole nanoseconds as used in timestamp arithmetic.
    ///
    /// The sentinel contributes zero so an unrepresentable correction does
    /// not poison a measurement.
    #[must_use]
    pub fn measurement_nanos(self) -> i64 {
        if self.too_big() {
            return 0;
        }
        self.0 / 65536
    }
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.too_big() {
            write!(f, "+Infns")
        } else {
            write!(f, "{:.3}ns", self.nanos())
        }
    }
}

// --- Timestamp ---

/// PTP timestamp: 48-bit seconds + 32-bit nanoseconds since the PTP epoch.
///
/// The all-zero timestamp is the "no time" sentinel, see [`Timestamp::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Seconds since the epoch; only the low 48 bits are representable.
    pub seconds: u64,
    /// Nanoseconds within the current second (`0..999_999_999`).
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Nanoseconds per second.
    pub const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Maximum seconds representable in 48 bits.
    pub const MAX_SECONDS_48BIT: u64 = (1u64 << 48) - 1;

    /// Wire size: 6-byte seconds + 4-byte nanoseconds.
    pub const SIZE: usize = 10;

    /// The empty ("no time") sentinel.
    pub const ZERO: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Create a new timestamp, clamping nanoseconds to the valid range.
    #[must_use]
    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds: nanoseconds.min(Self::NANOS_PER_SEC - 1),
        }
    }

    /// Current system time as a PTP timestamp (Unix seconds).
    #[must_use]
    pub fn now() -> Self {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self {
            seconds: dur.as_secs(),
            nanoseconds: dur.subsec_nanos(),
        }
    }

    /// Whether this is the all-zero "no time" sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seconds == 0 && self.nanoseconds == 0
    }

    /// Total nanoseconds since the epoch.
    #[must_use]
    pub fn to_nanos(&self) -> i128 {
        i128::from(self.seconds) * i128::from(Self::NANOS_PER_SEC) + i128::from(self.nanoseconds)
    }

    /// Create from total nanoseconds since the epoch.
    ///
    /// # Panics
    /// Panics on negative values or if seconds overflow `u64`.
    #[must_use]
    pub fn from_nanos(nanos: i128) -> Self {
        assert!(nanos >= 0, "PTP timestamp cannot be negative");
        let seconds =
            u64::try_from(nanos / i128::from(Self::NANOS_PER_SEC)).expect("seconds overflow");
        let nanoseconds = u32::try_from(nanos % i128::from(Self::NANOS_PER_SEC)).unwrap();
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Signed difference in nanoseconds: `self - other`.
    #[must_use]
    pub fn diff_nanos(&self, other: &Self) -> i128 {
        self.to_nanos() - other.to_nanos()
    }

    /// Encode as wire format: 6-byte seconds (BE) + 4-byte nanoseconds (BE).
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let sec_bytes = self.seconds.to_be_bytes();
        // 48-bit seconds: low 6 bytes of the u64
        buf[0..6].copy_from_slice(&sec_bytes[2..8]);
        buf[6..10].copy_from_slice(&self.nanoseconds.to_be_bytes());
        buf
    }

    /// Decode from wire format.
    ///
    /// Returns `None` if the slice is shorter than [`Self::SIZE`].
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        let seconds =
            u64::from_be_bytes([0, 0, data[0], data[1], data[2], data[3], data[4], data[5]]);
        let nanoseconds = u32::from_be_bytes([data[6], data[7], data[8], data[9]]);
        Some(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Convert to a `Duration` since the epoch.
    #[must_use]
    pub fn to_duration(&self) -> Duration {
        Duration::new(self.seconds, self.nanoseconds)
    }

    /// Create from a `Duration` since the epoch.
    #[must_use]
    pub fn from_duration(d: Duration) -> Self {
        Self {
            seconds: d.as_secs(),
            nanoseconds: d.subsec_nanos(),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i128;

    fn sub(self, rhs: Self) -> Self::Output {
        self.diff_nanos(&rhs)
    }
}

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self {
        Self::from_duration(d)
    }
}

// --- ClockIdentity / PortIdentity ---

/// 64-bit clock identity, conventionally derived from an interface MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockIdentity(pub u64);

impl ClockIdentity {
    /// Wire size in bytes.
    pub const SIZE: usize = 8;

    /// Derive an identity from a MAC address.
    ///
    /// EUI-48 addresses get `0xFFFE` inserted between the OUI and the NIC
    /// bytes; EUI-64 addresses map directly. Returns `None` for any other
    /// length.
    #[must_use]
    pub fn from_mac(mac: &[u8]) -> Option<Self> {
        match mac.len() {
            6 => Some(Self(u64::from_be_bytes([
                mac[0], mac[1], mac[2], 0xFF, 0xFE, mac[3], mac[4], mac[5],
            ]))),
            8 => {
                let bytes: [u8; 8] = mac.try_into().ok()?;
                Some(Self(u64::from_be_bytes(bytes)))
            }
            _ => None,
        }
    }

    /// Recover the EUI-48 MAC this identity was derived from.
    #[must_use]
    pub fn to_mac(self) -> [u8; 6] {
        let b = self.0.to_be_bytes();
        [b[0], b[1], b[2], b[5], b[6], b[7]]
    }

    /// Encode as 8 big-endian bytes.
    #[must_use]
    pub fn encode(self) -> [u8; Self::SIZE] {
        self.0.to_be_bytes()
    }

    /// Decode from 8 bytes.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self(u64::from_be_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ])))
    }
}

impl std::fmt::Display for ClockIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b = self.0.to_be_bytes();
        write!(
            f,
            "{:02x}{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}

/// PTP port identity: clock identity + 1-based port number.
///
/// Ordering is lexicographic on `(clock_identity, port_number)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PortIdentity {
    /// Identity of the owning clock.
    pub clock_identity: ClockIdentity,
    /// Port number within the clock.
    pub port_number: u16,
}

impl PortIdentity {
    /// Wire size in bytes.
    pub const SIZE: usize = 10;

    /// The all-ones identity meaning "any port".
    pub const WILDCARD: Self = Self {
        clock_identity: ClockIdentity(u64::MAX),
        port_number: u16::MAX,
    };

    /// Create a new port identity.
    #[must_use]
    pub fn new(clock_identity: ClockIdentity, port_number: u16) -> Self {
        Self {
            clock_identity,
            port_number,
        }
    }

    /// Encode as 10 bytes (8-byte clock identity + 2-byte port number, BE).
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.clock_identity.encode());
        buf[8..10].copy_from_slice(&self.port_number.to_be_bytes());
        buf
    }

    /// Decode from 10 bytes.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            clock_identity: ClockIdentity::decode(&data[0..8])?,
            port_number: u16::from_be_bytes([data[8], data[9]]),
        })
    }
}

impl std::fmt::Display for PortIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.clock_identity, self.port_number)
    }
}

// --- PortAddress ---

/// Network protocol discriminator for [`PortAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkProtocol(pub u16);

impl NetworkProtocol {
    /// UDP over IPv4.
    pub const UDP_IPV4: Self = Self(1);
    /// UDP over IPv6.
    pub const UDP_IPV6: Self = Self(2);
}

/// Protocol address of a PTP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAddress {
    /// Transport protocol of the address.
    pub protocol: NetworkProtocol,
    /// Raw address bytes (4 for IPv4, 16 for IPv6).
    pub address: Vec<u8>,
}

impl PortAddress {
    /// Create from an IP address.
    #[must_use]
    pub fn from_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Self {
                protocol: NetworkProtocol::UDP_IPV4,
                address: v4.octets().to_vec(),
            },
            IpAddr::V6(v6) => Self {
                protocol: NetworkProtocol::UDP_IPV6,
                address: v6.octets().to_vec(),
            },
        }
    }

    /// Interpret the address bytes as an IP address, if the protocol and
    /// length allow it.
    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        match self.protocol {
            NetworkProtocol::UDP_IPV4 => {
                let octets: [u8; 4] = self.address.as_slice().try_into().ok()?;
                Some(IpAddr::from(octets))
            }
            NetworkProtocol::UDP_IPV6 => {
                let octets: [u8; 16] = self.address.as_slice().try_into().ok()?;
                Some(IpAddr::from(octets))
            }
            _ => None,
        }
    }

    /// Encode as protocol + length + address bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.address.len());
        buf.extend_from_slice(&self.protocol.0.to_be_bytes());
        #[allow(clippy::cast_possible_truncation, reason = "addresses are 4 or 16 bytes")]
        buf.extend_from_slice(&(self.address.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.address);
        buf
    }

    /// Decode one port address, returning it and the number of bytes consumed.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<(Self, usize)> {
        if data.len() < 4 {
            return None;
        }
        let protocol = NetworkProtocol(u16::from_be_bytes([data[0], data[1]]));
        let len = usize::from(u16::from_be_bytes([data[2], data[3]]));
        if data.len() < 4 + len {
            return None;
        }
        Some((
            Self {
                protocol,
                address: data[4..4 + len].to_vec(),
            },
            4 + len,
        ))
    }
}

// --- PtpText ---

/// Length-prefixed UTF-8 text field.
///
/// On the wire: one length octet, the text bytes, and a single zero pad
/// octet when the text length is odd. The pad is consumed silently on
/// decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PtpText(pub String);

impl PtpText {
    /// Create from a string.
    ///
    /// Returns `None` if the text is longer than 255 bytes.
    #[must_use]
    pub fn new(text: &str) -> Option<Self> {
        if text.len() > 255 {
            return None;
        }
        Some(Self(text.to_string()))
    }

    /// Number of wire octets this text occupies, padding included.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        let len = self.0.len();
        1 + len + (len % 2)
    }

    /// Append the wire form to `buf`.
    pub fn write(&self, buf: &mut Vec<u8>) {
        #[allow(clippy::cast_possible_truncation, reason = "constructor caps length at 255")]
        buf.push(self.0.len() as u8);
        buf.extend_from_slice(self.0.as_bytes());
        if self.0.len() % 2 != 0 {
            buf.push(0);
        }
    }

    /// Read one text field, returning it and the number of bytes consumed
    /// (pad octet included).
    ///
    /// Returns `None` on a short buffer or invalid UTF-8.
    #[must_use]
    pub fn read(data: &[u8]) -> Option<(Self, usize)> {
        let len = usize::from(*data.first()?);
        let consumed = 1 + len + (len % 2);
        if data.len() < consumed {
            return None;
        }
        let text = std::str::from_utf8(&data[1..1 + len]).ok()?;
        Some((Self(text.to_string()), consumed))
    }
}

impl std::fmt::Display for PtpText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Clock quality vocabulary ---

/// Clock accuracy code (IEEE 1588-2019 table 7.6.2.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockAccuracy(pub u8);

impl ClockAccuracy {
    /// Within 25 ns.
    pub const NANOSECOND_25: Self = Self(0x20);
    /// Within 100 ns.
    pub const NANOSECOND_100: Self = Self(0x21);
    /// Within 250 ns.
    pub const NANOSECOND_250: Self = Self(0x22);
    /// Within 1 µs.
    pub const MICROSECOND_1: Self = Self(0x23);
    /// Within 2.5 µs.
    pub const MICROSECOND_2_5: Self = Self(0x24);
    /// Within 10 µs.
    pub const MICROSECOND_10: Self = Self(0x25);
    /// Within 25 µs.
    pub const MICROSECOND_25: Self = Self(0x26);
    /// Within 100 µs.
    pub const MICROSECOND_100: Self = Self(0x27);
    /// Within 250 µs.
    pub const MICROSECOND_250: Self = Self(0x28);
    /// Within 1 ms.
    pub const MILLISECOND_1: Self = Self(0x29);
    /// Within 2.5 ms.
    pub const MILLISECOND_2_5: Self = Self(0x2A);
    /// Within 10 ms.
    pub const MILLISECOND_10: Self = Self(0x2B);
    /// Within 25 ms.
    pub const MILLISECOND_25: Self = Self(0x2C);
    /// Within 100 ms.
    pub const MILLISECOND_100: Self = Self(0x2D);
    /// Within 250 ms.
    pub const MILLISECOND_250: Self = Self(0x2E);
    /// Within 1 s.
    pub const SECOND_1: Self = Self(0x2F);
    /// Within 10 s.
    pub const SECOND_10: Self = Self(0x30);
    /// Worse than 10 s.
    pub const SECOND_GREATER_10: Self = Self(0x31);
    /// Accuracy unknown.
    pub const UNKNOWN: Self = Self(0xFE);

    /// The smallest accuracy code covering an absolute offset.
    #[must_use]
    pub fn from_offset(offset: Duration) -> Self {
        let ns = offset.as_nanos();
        match ns {
            0..=25 => Self::NANOSECOND_25,
            26..=100 => Self::NANOSECOND_100,
            101..=250 => Self::NANOSECOND_250,
            251..=1_000 => Self::MICROSECOND_1,
            1_001..=2_500 => Self::MICROSECOND_2_5,
            2_501..=10_000 => Self::MICROSECOND_10,
            10_001..=25_000 => Self::MICROSECOND_25,
            25_001..=100_000 => Self::MICROSECOND_100,
            100_001..=250_000 => Self::MICROSECOND_250,
            250_001..=1_000_000 => Self::MILLISECOND_1,
            1_000_001..=2_500_000 => Self::MILLISECOND_2_5,
            2_500_001..=10_000_000 => Self::MILLISECOND_10,
            10_000_001..=25_000_000 => Self::MILLISECOND_25,
            25_000_001..=100_000_000 => Self::MILLISECOND_100,
            100_000_001..=250_000_000 => Self::MILLISECOND_250,
            250_000_001..=1_000_000_000 => Self::SECOND_1,
            1_000_000_001..=10_000_000_000 => Self::SECOND_10,
            _ => Self::SECOND_GREATER_10,
        }
    }

    /// Representative duration for this accuracy code.
    ///
    /// Codes outside the table (reserved or unknown) report `Duration::MAX`,
    /// meaning no bound is claimed.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::NANOSECOND_25 => Duration::from_nanos(25),
            Self::NANOSECOND_100 => Duration::from_nanos(100),
            Self::NANOSECOND_250 => Duration::from_nanos(250),
            Self::MICROSECOND_1 => Duration::from_micros(1),
            Self::MICROSECOND_2_5 => Duration::from_nanos(2_500),
            Self::MICROSECOND_10 => Duration::from_micros(10),
            Self::MICROSECOND_25 => Duration::from_micros(25),
            Self::MICROSECOND_100 => Duration::from_micros(100),
            Self::MICROSECOND_250 => Duration::from_micros(250),
            Self::MILLISECOND_1 => Duration::from_millis(1),
            Self::MILLISECOND_2_5 => Duration::from_micros(2_500),
            Self::MILLISECOND_10 => Duration::from_millis(10),
            Self::MILLISECOND_25 => Duration::from_millis(25),
            Self::MILLISECOND_100 => Duration::from_millis(100),
            Self::MILLISECOND_250 => Duration::from_millis(250),
            Self::SECOND_1 => Duration::from_secs(1),
            Self::SECOND_10 => Duration::from_secs(10),
            Self::SECOND_GREATER_10 => Duration::from_secs(25),
            _ => Duration::MAX,
        }
    }
}

/// Clock class code. A handful of well-known values from table 7.6.2.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockClass(pub u8);

impl ClockClass {
    /// Locked to a primary reference.
    pub const LOCKED: Self = Self(6);
    /// In holdover after losing a primary reference, still within its
    /// accuracy bound.
    pub const HOLDOVER: Self = Self(7);
    /// In holdover beyond its accuracy bound.
    pub const HOLDOVER_DEGRADED: Self = Self(52);
    /// Degraded alternative.
    pub const DEGRADED: Self = Self(187);
    /// Default-profile clock with no better claim.
    pub const DEFAULT: Self = Self(248);
    /// Slave-only clock.
    pub const SLAVE_ONLY: Self = Self(255);
}

/// Grandmaster clock quality as carried in Announce messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockQuality {
    /// Clock class.
    pub class: ClockClass,
    /// Clock accuracy code.
    pub accuracy: ClockAccuracy,
    /// Scaled log variance of the clock's stability.
    pub offset_scaled_log_variance: u16,
}

impl ClockQuality {
    /// Wire size in bytes.
    pub const SIZE: usize = 4;

    /// Encode as 4 bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.class.0;
        buf[1] = self.accuracy.0;
        buf[2..4].copy_from_slice(&self.offset_scaled_log_variance.to_be_bytes());
        buf
    }

    /// Decode from 4 bytes.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            class: ClockClass(data[0]),
            accuracy: ClockAccuracy(data[1]),
            offset_scaled_log_variance: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

impl Default for ClockQuality {
    fn default() -> Self {
        Self {
            class: ClockClass::DEFAULT,
            accuracy: ClockAccuracy::UNKNOWN,
            offset_scaled_log_variance: 0xFFFF,
        }
    }
}

/// Source of time used by the grandmaster (table 7.6.2.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSource(pub u8);

impl TimeSource {
    /// Atomic clock.
    pub const ATOMIC_CLOCK: Self = Self(0x10);
    /// Satellite navigation system.
    pub const GNSS: Self = Self(0x20);
    /// Terrestrial radio.
    pub const TERRESTRIAL_RADIO: Self = Self(0x30);
    /// Serial time code.
    pub const SERIAL_TIME_CODE: Self = Self(0x39);
    /// Another PTP domain.
    pub const PTP: Self = Self(0x40);
    /// NTP.
    pub const NTP: Self = Self(0x50);
    /// Manually set.
    pub const HAND_SET: Self = Self(0x60);
    /// Any other source.
    pub const OTHER: Self = Self(0x90);
    /// Free-running oscillator.
    pub const INTERNAL_OSCILLATOR: Self = Self(0xA0);
}

impl std::fmt::Display for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            Self::ATOMIC_CLOCK => "ATOMIC_CLOCK",
            Self::GNSS => "GNSS",
            Self::TERRESTRIAL_RADIO => "TERRESTRIAL_RADIO",
            Self::SERIAL_TIME_CODE => "SERIAL_TIME_CODE",
            Self::PTP => "PTP",
            Self::NTP => "NTP",
            Self::HAND_SET => "HAND_SET",
            Self::OTHER => "OTHER",
            Self::INTERNAL_OSCILLATOR => "INTERNAL_OSCILLATOR",
            _ => return write!(f, "TIME_SOURCE(0x{:02x})", self.0),
        };
        f.write_str(name)
    }
}
