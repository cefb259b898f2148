pub mod macros;

pub mod sagepay;

pub mod sagepaydirect;
pub use self::sagepaydirect::Sagepaydirect;

pub mod sagepayserver;
pub use self::sagepayserver::Sagepayserver;

pub mod sagepayform;
pub use self::sagepayform::Sagepayform;

pub mod sagepaypi;
pub use self::sagepaypi::Sagepaypi;
