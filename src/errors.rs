use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum AdTrackError {
    InvalidEvent(String),
    IngestionFailed(String),
    AggregationQuery(String),
    StreamTransport(String),
    AdNotFound(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    Serialization(String),
    DateParse(String),
}

impl AdTrackError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AdTrackError::InvalidEvent(_) => "E001",
            AdTrackError::IngestionFailed(_) => "E002",
            AdTrackError::AggregationQuery(_) => "E003",
            AdTrackError::StreamTransport(_) => "E004",
            AdTrackError::AdNotFound(_) => "E005",
            AdTrackError::DatabaseConfig(_) => "E006",
            AdTrackError::DatabaseConnection(_) => "E007",
            AdTrackError::DatabaseOperation(_) => "E008",
            AdTrackError::FileOperation(_) => "E009",
            AdTrackError::Validation(_) => "E010",
            AdTrackError::Serialization(_) => "E011",
            AdTrackError::DateParse(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AdTrackError::InvalidEvent(_) => "Invalid Event",
            AdTrackError::IngestionFailed(_) => "Ingestion Failed",
            AdTrackError::AggregationQuery(_) => "Aggregation Query Error",
            AdTrackError::StreamTransport(_) => "Stream Transport Error",
            AdTrackError::AdNotFound(_) => "Advertisement Not Found",
            AdTrackError::DatabaseConfig(_) => "Database Configuration Error",
            AdTrackError::DatabaseConnection(_) => "Database Connection Error",
            AdTrackError::DatabaseOperation(_) => "Database Operation Error",
            AdTrackError::FileOperation(_) => "File Operation Error",
            AdTrackError::Validation(_) => "Validation Error",
            AdTrackError::Serialization(_) => "Serialization Error",
            AdTrackError::DateParse(_) => "Date Parse Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AdTrackError::InvalidEvent(msg)
            | AdTrackError::IngestionFailed(msg)
            | AdTrackError::AggregationQuery(msg)
            | AdTrackError::StreamTransport(msg)
            | AdTrackError::AdNotFound(msg)
            | AdTrackError::DatabaseConfig(msg)
            | AdTrackError::DatabaseConnection(msg)
            | AdTrackError::DatabaseOperation(msg)
            | AdTrackError::FileOperation(msg)
            | AdTrackError::Validation(msg)
            | AdTrackError::Serialization(msg)
            | AdTrackError::DateParse(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    ///
    /// 客户端输入问题返回 4xx，存储与传输故障返回 5xx。
    pub fn http_status(&self) -> StatusCode {
        match self {
            AdTrackError::InvalidEvent(_)
            | AdTrackError::AggregationQuery(_)
            | AdTrackError::Validation(_)
            | AdTrackError::DateParse(_) => StatusCode::BAD_REQUEST,
            AdTrackError::AdNotFound(_) => StatusCode::NOT_FOUND,
            AdTrackError::IngestionFailed(_)
            | AdTrackError::StreamTransport(_)
            | AdTrackError::DatabaseConfig(_)
            | AdTrackError::DatabaseConnection(_)
            | AdTrackError::DatabaseOperation(_)
            | AdTrackError::FileOperation(_)
            | AdTrackError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为调用方可修正的错误
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AdTrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AdTrackError {}

// 便捷的构造函数
impl AdTrackError {
    pub fn invalid_event<T: Into<String>>(msg: T) -> Self {
        AdTrackError::InvalidEvent(msg.into())
    }

    pub fn ingestion_failed<T: Into<String>>(msg: T) -> Self {
        AdTrackError::IngestionFailed(msg.into())
    }

    pub fn aggregation_query<T: Into<String>>(msg: T) -> Self {
        AdTrackError::AggregationQuery(msg.into())
    }

    pub fn stream_transport<T: Into<String>>(msg: T) -> Self {
        AdTrackError::StreamTransport(msg.into())
    }

    pub fn ad_not_found<T: Into<String>>(msg: T) -> Self {
        AdTrackError::AdNotFound(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        AdTrackError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        AdTrackError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        AdTrackError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        AdTrackError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AdTrackError::Validation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AdTrackError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        AdTrackError::DateParse(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AdTrackError {
    fn from(err: sea_orm::DbErr) -> Self {
        AdTrackError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AdTrackError {
    fn from(err: std::io::Error) -> Self {
        AdTrackError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AdTrackError {
    fn from(err: serde_json::Error) -> Self {
        AdTrackError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AdTrackError {
    fn from(err: chrono::ParseError) -> Self {
        AdTrackError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdTrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_errors_map_to_expected_status() {
        assert_eq!(
            AdTrackError::invalid_event("missing adId").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdTrackError::ingestion_failed("disk full").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AdTrackError::ad_not_found("ad-404").http_status(),
            StatusCode::NOT_FOUND
        );
        assert!(AdTrackError::aggregation_query("bad date").is_client_error());
        assert!(!AdTrackError::stream_transport("closed").is_client_error());
    }

    #[test]
    fn format_simple_includes_type_and_message() {
        let err = AdTrackError::invalid_event("sessionId is required");
        assert_eq!(err.format_simple(), "Invalid Event: sessionId is required");
        assert_eq!(err.to_string(), err.format_simple());
        assert_eq!(err.code(), "E001");
    }
}
