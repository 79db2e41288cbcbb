pub mod app;
pub mod run;

pub use app::App;
pub use run::Runner;
