pub mod origin_allowlist;

pub use origin_allowlist::OriginAllowlist;
