pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{
    BalanceResponse, BotLogRequest, BotLogResponse, BotsOnlineRequest, BotsOnlineResponse,
    FundingUpdateRequest, FundingUpdateResponse, WithdrawRequest, WithdrawResponse,
};
pub use http_server::{build_router, start_server};
pub use server::{ApiConfig, ApiServer};
