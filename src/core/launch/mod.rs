pub mod classpath;
pub mod task;

pub use classpath::{join_classpath, ClasspathResolver, ResolvedClasspath};
pub use task::{launch, LaunchPlan, LaunchedProcess};
