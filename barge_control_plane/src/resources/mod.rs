mod kind;
mod uri;

pub use self::kind::ResourceKind;
pub use self::uri::{ResourceUri, ResourceUriError};
