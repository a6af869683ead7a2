// ==========================================
// 零售库存决策支持系统 - 导入层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入层错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("不支持的文件格式: {0}")]
    UnsupportedFormat(String),
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
