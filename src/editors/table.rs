use crate::editors::blanks::{collect_blank_ids, BlankSet};
use crate::editors::{check_index, EditorCommit, QuestionEditor};
use crate::error::EditorError;
use crate::models::schema::{BlankAnswers, BlankConfig, TableData, TableStructure};

/// 表格填空编辑器
///
/// 空位在所有单元格中识别（表头不参与），跨单元格去重，以第一次出现为准。
#[derive(Debug, Clone, Default)]
pub struct TableEditor {
    table: TableStructure,
    blanks: BlankSet,
}

impl TableEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &[String] {
        &self.table.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.table.rows
    }

    pub fn blanks(&self) -> &[BlankConfig] {
        self.blanks.blanks()
    }

    pub fn answers(&self, blank_id: &str) -> &[String] {
        self.blanks.answers(blank_id)
    }

    /// 扫描全部单元格并同步空位，返回是否有变化
    ///
    /// 表格未变时重复调用不会产生任何更新。
    pub fn detect_blanks(&mut self) -> bool {
        let mut ids = Vec::new();
        for cell in self.table.rows.iter().flatten() {
            collect_blank_ids(cell, &mut ids);
        }
        self.blanks.sync(&ids)
    }

    pub fn add_column(&mut self) {
        let n = self.table.headers.len();
        self.table.headers.push(format!("Column {}", n + 1));
        for row in &mut self.table.rows {
            row.push(String::new());
        }
    }

    pub fn remove_column(&mut self, index: usize) -> Result<(), EditorError> {
        check_index(index, self.table.headers.len())?;
        if self.table.headers.len() <= 1 {
            return Err(EditorError::MinimumReached { min: 1 });
        }
        self.table.headers.remove(index);
        for row in &mut self.table.rows {
            if index < row.len() {
                row.remove(index);
            }
        }
        self.detect_blanks();
        Ok(())
    }

    pub fn add_row(&mut self) {
        self.table.rows.push(vec![String::new(); self.table.headers.len()]);
    }

    pub fn remove_row(&mut self, index: usize) -> Result<(), EditorError> {
        check_index(index, self.table.rows.len())?;
        if self.table.rows.len() <= 1 {
            return Err(EditorError::MinimumReached { min: 1 });
        }
        self.table.rows.remove(index);
        self.detect_blanks();
        Ok(())
    }

    pub fn set_header(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditorError> {
        check_index(index, self.table.headers.len())?;
        self.table.headers[index] = text.into();
        Ok(())
    }

    /// 修改单元格并重新识别空位
    pub fn set_cell(&mut self, row: usize, col: usize, text: impl Into<String>) -> Result<(), EditorError> {
        check_index(row, self.table.rows.len())?;
        let cells = &mut self.table.rows[row];
        check_index(col, cells.len())?;
        cells[col] = text.into();
        self.detect_blanks();
        Ok(())
    }

    pub fn set_max_words(&mut self, blank_id: &str, max_words: u8) -> Result<(), EditorError> {
        self.blanks.set_max_words(blank_id, max_words)
    }

    pub fn set_case_sensitive(&mut self, blank_id: &str, case_sensitive: bool) -> Result<(), EditorError> {
        self.blanks.set_case_sensitive(blank_id, case_sensitive)
    }

    pub fn add_answer(&mut self, blank_id: &str, text: &str) -> Result<(), EditorError> {
        self.blanks.add_answer(blank_id, text)
    }

    pub fn remove_answer(&mut self, blank_id: &str, index: usize) -> Result<(), EditorError> {
        self.blanks.remove_answer(blank_id, index)
    }
}

impl QuestionEditor for TableEditor {
    fn commit(&self) -> serde_json::Result<EditorCommit> {
        let data = TableData {
            table_structure: self.table.clone(),
            blanks: self.blanks.blanks().to_vec(),
        };
        EditorCommit::from_parts(&data, &self.blanks.committed_answers())
    }

    fn load(&mut self, commit: &EditorCommit) -> serde_json::Result<()> {
        let (data, answers): (TableData, BlankAnswers) = commit.to_parts()?;
        self.table = data.table_structure;
        self.blanks = BlankSet::from_parts(data.blanks, answers);
        self.detect_blanks();
        Ok(())
    }
}
