//! 题目草稿处理上下文
//!
//! 封装"我正在处理哪个题组文件的第几题"这一信息

use std::fmt::Display;
use std::path::PathBuf;

use crate::services::Container;

/// 题目草稿处理上下文
#[derive(Debug, Clone)]
pub struct DraftCtx {
    /// 题组名称
    pub set_name: String,

    /// 文件索引（仅用于日志显示）
    pub file_index: usize,

    /// 题目编号
    pub question_number: u32,

    /// 所属考试部分 ID
    pub section_id: i64,

    /// 已创建的 Part / 文章
    pub container: Container,

    /// 草稿中相对路径的基准目录
    pub base_dir: PathBuf,
}

impl DraftCtx {
    pub fn new(
        set_name: String,
        file_index: usize,
        question_number: u32,
        section_id: i64,
        container: Container,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            set_name,
            file_index,
            question_number,
            section_id,
            container,
            base_dir,
        }
    }
}

impl Display for DraftCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题组 {} 题目#{}]", self.set_name, self.question_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_set_and_question() {
        let ctx = DraftCtx::new("Cambridge 18 Test 1".into(), 2, 7, 1, Container::Part(20), PathBuf::from("."));
        assert_eq!(ctx.to_string(), "[题组 Cambridge 18 Test 1 题目#7]");
    }
}
