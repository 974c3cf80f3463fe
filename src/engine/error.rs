// ==========================================
// 玻璃深加工排产系统 - 引擎层错误类型
// ==========================================
// 职责: 影响分析等操作的输入错误，及上抛的仓储错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("订单未找到: {0}")]
    OrderNotFound(String),

    #[error("订单编号重复: {0}")]
    DuplicateOrder(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type EngineResult<T> = Result<T, EngineError>;
