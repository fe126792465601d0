// ==========================================
// 工程采购管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 所有错误信息必须包含显式原因
// ==========================================

use crate::domain::budget::{BudgetRejection, ConfirmRejection};
use crate::domain::inquiry::SendRejection;
use crate::domain::types::{InquiryStatus, PurchaseOrderStatus};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 预算错误
    // ==========================================
    #[error("项目未设置预算: project={project}")]
    BudgetNotFound { project: String },

    #[error("预算不足: project={project}, remaining={remaining}, required={required}")]
    InsufficientBudget {
        project: String,
        remaining: f64,
        required: f64,
    },

    /// 采购单确认失败（包装具体原因, 台账与采购单均未修改）
    #[error("采购单确认失败: po_id={po_id}: {source}")]
    ConfirmationFailed {
        po_id: String,
        #[source]
        source: Box<ApiError>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 确认失败的内层原因
    pub fn confirmation_cause(&self) -> Option<&ApiError> {
        match self {
            ApiError::ConfirmationFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从领域拒绝原因转换
// ==========================================

impl From<BudgetRejection> for ApiError {
    fn from(rejection: BudgetRejection) -> Self {
        match rejection {
            BudgetRejection::BudgetNotFound { project_name } => ApiError::BudgetNotFound {
                project: project_name,
            },
            BudgetRejection::InsufficientBudget {
                project_name,
                remaining,
                required,
            } => ApiError::InsufficientBudget {
                project: project_name,
                remaining,
                required,
            },
        }
    }
}

impl From<ConfirmRejection> for ApiError {
    fn from(rejection: ConfirmRejection) -> Self {
        match rejection {
            ConfirmRejection::NotCreated { current } => ApiError::InvalidStateTransition {
                from: current,
                to: PurchaseOrderStatus::Confirmed.to_string(),
            },
            ConfirmRejection::Budget(budget) => budget.into(),
        }
    }
}

impl From<SendRejection> for ApiError {
    fn from(rejection: SendRejection) -> Self {
        match rejection {
            SendRejection::NotDraft(status) => ApiError::InvalidStateTransition {
                from: status.to_string(),
                to: InquiryStatus::Sent.to_string(),
            },
            SendRejection::NoItems => ApiError::ValidationError("询价单没有询价项目".to_string()),
            SendRejection::NoSuppliers => {
                ApiError::ValidationError("询价单没有目标供应商".to_string())
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "PurchaseOrder".to_string(),
            id: "PO000001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("PurchaseOrder"));
                assert!(msg.contains("PO000001"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_confirm_rejection_conversion() {
        let err: ApiError = ConfirmRejection::NotCreated {
            current: "CONFIRMED".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            ApiError::InvalidStateTransition { ref from, ref to } if from == "CONFIRMED" && to == "CONFIRMED"
        ));

        let err: ApiError = ConfirmRejection::Budget(BudgetRejection::InsufficientBudget {
            project_name: "A".into(),
            remaining: 10.0,
            required: 20.0,
        })
        .into();
        assert!(matches!(err, ApiError::InsufficientBudget { .. }));
    }

    #[test]
    fn test_send_rejection_conversion() {
        assert!(matches!(
            ApiError::from(SendRejection::NoItems),
            ApiError::ValidationError(_)
        ));
        assert!(matches!(
            ApiError::from(SendRejection::NotDraft(InquiryStatus::Sent)),
            ApiError::InvalidStateTransition { .. }
        ));
    }
}
