mod extract;
mod inspect;

pub use self::extract::ExtractCommand;
pub use self::inspect::InspectCommand;
