mod rollout;
pub use self::rollout::*;
