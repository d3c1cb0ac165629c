/// Public STUN servers used when no ICE configuration is supplied.
pub const DEFAULT_STUN_ADDR: &str = "stun:stun.stunprotocol.org:3478";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun.l.google.com:19302";
