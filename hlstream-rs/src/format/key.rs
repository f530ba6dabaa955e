use smol_str::SmolStr;

/// Encryption method declared by an EXT-X-KEY directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyMethod {
    /// Segments are not encrypted
    #[default]
    None,
    Aes128,
    SampleAes,
    /// A method this library does not know about
    Other(SmolStr),
}

impl KeyMethod {
    pub fn from_name(name: &str) -> Self {
        match name {
            "NONE" => Self::None,
            "AES-128" => Self::Aes128,
            "SAMPLE-AES" => Self::SampleAes,
            _ => Self::Other(name.into()),
        }
    }
}

/// Encryption parameters in effect for the segments following a KEY
/// directive, until the next one replaces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Key {
    pub method: KeyMethod,
    pub uri: Option<SmolStr>,
    /// Initialization vector, up to 128 bits
    pub iv: Option<u128>,
    pub format: Option<SmolStr>,
    pub format_version: Option<SmolStr>,
}
