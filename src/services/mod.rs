pub mod account_service;
pub mod leaderboard_service;
pub mod prompt_service;
pub mod verification_service;

pub use account_service::AccountService;
pub use leaderboard_service::LeaderboardService;
pub use prompt_service::PromptService;
pub use verification_service::VerificationService;
