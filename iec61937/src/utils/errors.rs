#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("Header needs at least {needed} bytes, got {available}")]
    TooShort { needed: usize, available: usize },

    #[error("Invalid sync word")]
    InvalidSync,

    #[error("Unsupported bsid {0}")]
    UnsupportedBsid(u8),

    #[error("Invalid fscod {0:#X}")]
    InvalidSampleRateCode(u8),

    #[error("frmsizecod must be < 38. Read {0}")]
    InvalidFrameSizeCode(u8),

    #[error("E-AC-3 strmtyp 3 is reserved")]
    ReservedStreamType,

    #[error("DTS nblks must be >= 5. Read {0}")]
    DtsTooFewBlocks(u8),

    #[error("DTS fsize must be >= 95. Read {0}")]
    DtsFrameTooSmall(u16),

    #[error("Invalid DTS sfreq. Read {0:#X}")]
    DtsInvalidSampleRate(u8),

    #[error("Bitstream read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum EncapsulateError {
    #[error("Header parse failed: {0}")]
    Header(#[from] HeaderError),

    #[error("Parsed frame size {size} exceeds the {available} bytes of input")]
    FrameTruncated { size: usize, available: usize },

    #[error("Expected an AC-3 frame, found E-AC-3")]
    UnexpectedEac3,

    #[error("Frame of {needed} bytes does not fit, {available} bytes left in the burst")]
    InsufficientSpace { needed: usize, available: usize },

    #[error("TrueHD frame {index} of {len} bytes overflows its MAT slot (padding {padding})")]
    MatSlotOverflow {
        index: usize,
        len: usize,
        padding: isize,
    },

    #[error("Frame size {0} not supported")]
    UnsupportedFrameSize(u32),

    #[error("Failed to allocate {0} bytes for the output burst")]
    Allocation(usize),

    #[error("Cannot begin a burst while another one is in progress")]
    PacketInProgress,

    #[error("No burst in progress")]
    NoPacketInProgress,

    #[error("Burst size must be > 8 and a multiple of 4. Got {0}")]
    InvalidPacketSize(usize),

    #[error("Write of {needed} bytes exceeds the {remaining} bytes remaining")]
    WriteOutOfBounds { needed: usize, remaining: usize },

    #[error("Header space can only be dropped before any payload is written")]
    HeaderRewind,

    #[error("Burst header needs payload behind it")]
    EmptyBurst,

    #[error("Burst length {0} does not fit the 16-bit length field")]
    BurstLengthOverflow(usize),
}

impl EncapsulateError {
    /// Errors raised by misuse of the packet writer rather than by input data.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::PacketInProgress
                | Self::NoPacketInProgress
                | Self::InvalidPacketSize(_)
                | Self::WriteOutOfBounds { .. }
                | Self::HeaderRewind
                | Self::EmptyBurst
                | Self::BurstLengthOverflow(_)
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Insufficient buffer data for frame extraction")]
    InsufficientData,

    #[error("Skipped {0} bytes without a valid sync pattern")]
    SkippedBytes(usize),

    #[error("Invalid header at sync position: {0}")]
    InvalidHeader(#[from] HeaderError),

    #[error("Access unit length {0} out of range")]
    InvalidAccessUnitLength(usize),
}
