//! 题目创作服务 - 业务能力层
//!
//! 把 TOML 草稿交给对应的编辑器，得到提交数据后校验，再调用后端创建。

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::clients::{ApiClient, UploadKind};
use crate::checking::validate_commit;
use crate::editors::{
    CompletionEditor, DiagramEditor, EditorCommit, MatchingEditor, McqEditor, QuestionEditor, ShortAnswerEditor,
    TableEditor, TfngEditor,
};
use crate::error::{AppError, EditorError, Result, ValidationError};
use crate::models::schema::FreeTextAnswers;
use crate::models::sheet::{
    ChoiceDraft, CompletionDraft, DiagramDraft, MatchingDraft, QuestionDraft, ShortAnswerDraft, SpeakingTaskDraft,
    TableDraft, TfngDraft, WritingTaskDraft,
};
use crate::models::test::{
    ListeningPartCreate, ReadingPassageCreate, SpeakingTask, SpeakingTaskCreate, WritingTask, WritingTaskCreate,
};
use crate::models::{Question, QuestionCreate, QuestionFamily, QuestionSet, SectionType};
use crate::utils::word_count;

/// 题目挂载的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Part(i64),
    Passage(i64),
    /// 写作/口语任务直接挂在考试部分下
    Section(i64),
}

impl Container {
    /// 需要写回输入文件的已创建 ID（部分下的任务没有）
    pub fn created_id(self) -> Option<i64> {
        match self {
            Container::Part(id) | Container::Passage(id) => Some(id),
            Container::Section(_) => None,
        }
    }
}

fn missing(draft: &QuestionDraft, table: &'static str) -> AppError {
    ValidationError::MissingDraft {
        question_type: draft.question_type.clone(),
        table,
    }
    .into()
}

/// 把草稿变成编辑器提交数据并校验
///
/// 标注题的图片地址需要事先确定（已上传），通过 `image_url` 传入。
pub fn build_commit(draft: &QuestionDraft, image_url: Option<&str>) -> Result<EditorCommit> {
    let family = QuestionFamily::from_type(&draft.question_type);
    let commit = match family {
        QuestionFamily::Completion => {
            let d = draft.completion.as_ref().ok_or_else(|| missing(draft, "completion"))?;
            completion_commit(d)?
        }
        QuestionFamily::Table => {
            let d = draft.table.as_ref().ok_or_else(|| missing(draft, "table"))?;
            table_commit(d)?
        }
        QuestionFamily::Matching => {
            let d = draft.matching.as_ref().ok_or_else(|| missing(draft, "matching"))?;
            matching_commit(d)?
        }
        QuestionFamily::Diagram => {
            let d = draft.diagram.as_ref().ok_or_else(|| missing(draft, "diagram"))?;
            let url = image_url.or(d.image_url.as_deref()).unwrap_or_default();
            diagram_commit(d, url)?
        }
        QuestionFamily::Tfng => {
            let d = draft.tfng.as_ref().ok_or_else(|| missing(draft, "tfng"))?;
            tfng_commit(&draft.question_type, d)?
        }
        QuestionFamily::MultipleChoice => {
            let d = draft.choice.as_ref().ok_or_else(|| missing(draft, "choice"))?;
            choice_commit(d)?
        }
        QuestionFamily::ShortAnswer => {
            let d = draft.short_answer.as_ref().ok_or_else(|| missing(draft, "short_answer"))?;
            short_answer_commit(d)?
        }
        QuestionFamily::FreeText => {
            let d = draft.short_answer.as_ref().ok_or_else(|| missing(draft, "short_answer"))?;
            free_text_commit(d)?
        }
    };
    validate_commit(&draft.question_type, &commit)?;
    debug!("题目 {} ({}) 草稿校验通过", draft.question_number, family);
    Ok(commit)
}

/// 填空类编辑器共有的空位配置能力
trait BlankEditing {
    fn set_max_words(&mut self, blank_id: &str, max_words: u8) -> std::result::Result<(), EditorError>;
    fn set_case_sensitive(&mut self, blank_id: &str, case_sensitive: bool) -> std::result::Result<(), EditorError>;
    fn add_answer(&mut self, blank_id: &str, text: &str) -> std::result::Result<(), EditorError>;
}

impl BlankEditing for CompletionEditor {
    fn set_max_words(&mut self, blank_id: &str, max_words: u8) -> std::result::Result<(), EditorError> {
        CompletionEditor::set_max_words(self, blank_id, max_words)
    }

    fn set_case_sensitive(&mut self, blank_id: &str, case_sensitive: bool) -> std::result::Result<(), EditorError> {
        CompletionEditor::set_case_sensitive(self, blank_id, case_sensitive)
    }

    fn add_answer(&mut self, blank_id: &str, text: &str) -> std::result::Result<(), EditorError> {
        CompletionEditor::add_answer(self, blank_id, text)
    }
}

impl BlankEditing for TableEditor {
    fn set_max_words(&mut self, blank_id: &str, max_words: u8) -> std::result::Result<(), EditorError> {
        TableEditor::set_max_words(self, blank_id, max_words)
    }

    fn set_case_sensitive(&mut self, blank_id: &str, case_sensitive: bool) -> std::result::Result<(), EditorError> {
        TableEditor::set_case_sensitive(self, blank_id, case_sensitive)
    }

    fn add_answer(&mut self, blank_id: &str, text: &str) -> std::result::Result<(), EditorError> {
        TableEditor::add_answer(self, blank_id, text)
    }
}

/// 按草稿设置字数限制、大小写与答案；草稿中引用不存在的空位时报错
fn configure_blanks<E: BlankEditing>(
    editor: &mut E,
    max_words: &BTreeMap<String, u8>,
    case_sensitive: &[String],
    answers: &BTreeMap<String, Vec<String>>,
) -> std::result::Result<(), EditorError> {
    for (blank_id, limit) in max_words {
        editor.set_max_words(blank_id, *limit)?;
    }
    for blank_id in case_sensitive {
        editor.set_case_sensitive(blank_id, true)?;
    }
    for (blank_id, list) in answers {
        for answer in list {
            editor.add_answer(blank_id, answer)?;
        }
    }
    Ok(())
}

fn completion_commit(d: &CompletionDraft) -> Result<EditorCommit> {
    let mut editor = CompletionEditor::new();
    editor.set_template_text(d.template_text.clone());
    configure_blanks(&mut editor, &d.max_words, &d.case_sensitive, &d.answers)?;
    Ok(editor.commit()?)
}

fn table_commit(d: &TableDraft) -> Result<EditorCommit> {
    let mut editor = TableEditor::new();
    while editor.headers().len() < d.headers.len() {
        editor.add_column();
    }
    while editor.headers().len() > d.headers.len() {
        editor.remove_column(editor.headers().len() - 1)?;
    }
    for (i, header) in d.headers.iter().enumerate() {
        editor.set_header(i, header.clone())?;
    }
    while editor.rows().len() < d.rows.len() {
        editor.add_row();
    }
    while editor.rows().len() > d.rows.len() {
        editor.remove_row(editor.rows().len() - 1)?;
    }
    for (r, row) in d.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            editor.set_cell(r, c, cell.clone())?;
        }
    }
    configure_blanks(&mut editor, &d.max_words, &d.case_sensitive, &d.answers)?;
    Ok(editor.commit()?)
}

fn matching_commit(d: &MatchingDraft) -> Result<EditorCommit> {
    let mut editor = MatchingEditor::new();
    while editor.items().len() < d.items.len() {
        editor.add_item();
    }
    while editor.items().len() > d.items.len().max(1) {
        editor.remove_item(editor.items().len() - 1)?;
    }
    for (i, text) in d.items.iter().enumerate() {
        editor.set_item_text(i, text.clone())?;
    }
    while editor.options().len() < d.options.len() {
        editor.add_option()?;
    }
    while editor.options().len() > d.options.len().max(2) {
        editor.remove_option(editor.options().len() - 1)?;
    }
    for (i, text) in d.options.iter().enumerate() {
        editor.set_option_text(i, text.clone())?;
    }
    editor.set_allow_option_reuse(d.allow_option_reuse);
    for (item, label) in &d.mappings {
        let item_number: u32 = item.trim().parse().map_err(|_| ValidationError::InvalidMapping {
            item: 0,
            label: format!("{} = {}", item, label),
        })?;
        editor.set_mapping(item_number, &label.trim().to_uppercase())?;
    }
    Ok(editor.commit()?)
}

fn diagram_commit(d: &DiagramDraft, image_url: &str) -> Result<EditorCommit> {
    let mut editor = DiagramEditor::new();
    editor.set_image_url(image_url);
    if let Some(limit) = d.max_words_per_label {
        editor.set_max_words_per_label(limit)?;
    }
    let [width, height] = d.image_size;
    for pin in &d.pins {
        let label_id = editor.place_label(pin.x, pin.y, width, height)?;
        for answer in &pin.answers {
            editor.add_answer(&label_id, answer)?;
        }
    }
    Ok(editor.commit()?)
}

fn tfng_commit(question_type: &str, d: &TfngDraft) -> Result<EditorCommit> {
    let mut editor = TfngEditor::new(question_type);
    if let Some(mode) = d.answer_type {
        editor.set_answer_type(mode);
    }
    while editor.statements().len() < d.statements.len() {
        editor.add_statement();
    }
    for (i, statement) in d.statements.iter().enumerate() {
        editor.set_statement_text(i, statement.text.clone())?;
        editor.set_answer(i as u32 + 1, &statement.answer)?;
    }
    Ok(editor.commit()?)
}

fn choice_commit(d: &ChoiceDraft) -> Result<EditorCommit> {
    if !d.allow_multiple && d.correct.len() > 1 {
        return Err(ValidationError::SingleSelectAnswerCount(d.correct.len()).into());
    }
    let mut editor = McqEditor::new();
    while editor.options().len() < d.options.len() {
        editor.add_option()?;
    }
    while editor.options().len() > d.options.len().max(2) {
        editor.remove_option(editor.options().len() - 1)?;
    }
    for (i, text) in d.options.iter().enumerate() {
        editor.set_option_text(i, text.clone())?;
    }
    editor.set_allow_multiple(d.allow_multiple);
    for label in &d.correct {
        editor.toggle_correct(&label.trim().to_uppercase())?;
    }
    Ok(editor.commit()?)
}

fn short_answer_commit(d: &ShortAnswerDraft) -> Result<EditorCommit> {
    let mut editor = ShortAnswerEditor::new();
    if let Some(limit) = d.max_words {
        editor.set_max_words(limit)?;
    }
    editor.set_case_sensitive(d.case_sensitive);
    for answer in &d.answers {
        editor.add_answer(answer)?;
    }
    Ok(editor.commit()?)
}

/// 无法识别的题型：第一个答案为标准答案，其余为备选
fn free_text_commit(d: &ShortAnswerDraft) -> Result<EditorCommit> {
    let mut answers = d.answers.iter().map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    let free = FreeTextAnswers {
        correct_answer: answers.next().unwrap_or_default(),
        alternative_answers: answers.collect(),
        case_sensitive: d.case_sensitive,
    };
    Ok(EditorCommit::from_parts(&Value::Null, &free)?)
}

/// 写作任务创建请求
///
/// Task 1 默认 `writing_task1_academic`（150 词，20 分钟），
/// Task 2 默认 `writing_task2_essay`（250 词，40 分钟）。
pub fn writing_task_create(
    section_id: i64,
    draft: &WritingTaskDraft,
    image_url: Option<String>,
) -> std::result::Result<WritingTaskCreate, ValidationError> {
    let (default_type, default_words, default_minutes) = match draft.task_number {
        1 => ("writing_task1_academic", 150, 20),
        2 => ("writing_task2_essay", 250, 40),
        other => return Err(ValidationError::InvalidTaskNumber(other)),
    };
    if draft.prompt_text.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt(draft.task_number));
    }
    Ok(WritingTaskCreate {
        section_id,
        task_number: draft.task_number,
        task_type: draft.task_type.clone().unwrap_or_else(|| default_type.to_string()),
        prompt_text: draft.prompt_text.trim().to_string(),
        image_url,
        word_limit_min: draft.word_limit_min.unwrap_or(default_words),
        word_limit_max: draft.word_limit_max,
        time_limit_minutes: Some(draft.time_limit_minutes.unwrap_or(default_minutes)),
    })
}

/// 口语任务创建请求
///
/// Part 2 默认准备 60 秒、作答 120 秒并带题卡要点；其余 Part 不准备，作答 240 秒。
pub fn speaking_task_create(
    section_id: i64,
    draft: &SpeakingTaskDraft,
) -> std::result::Result<SpeakingTaskCreate, ValidationError> {
    if !(1..=3).contains(&draft.part_number) {
        return Err(ValidationError::InvalidTaskNumber(draft.part_number));
    }
    if draft.prompt_text.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt(draft.part_number));
    }
    let is_cue_card = draft.part_number == 2;
    let (default_prep, default_speak) = if is_cue_card { (60, 120) } else { (0, 240) };
    let points: Vec<String> = draft
        .cue_card_points
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    Ok(SpeakingTaskCreate {
        section_id,
        part_number: draft.part_number,
        task_type: draft
            .task_type
            .clone()
            .unwrap_or_else(|| format!("speaking_part{}", draft.part_number)),
        prompt_text: draft.prompt_text.trim().to_string(),
        preparation_time_seconds: Some(draft.preparation_time_seconds.unwrap_or(default_prep)),
        speaking_time_seconds: draft.speaking_time_seconds.unwrap_or(default_speak),
        order: draft.part_number as i32,
        cue_card_points: (is_cue_card && !points.is_empty()).then_some(points),
    })
}

/// 组装创建请求
pub fn to_create(
    section_id: i64,
    container: Container,
    draft: &QuestionDraft,
    commit: EditorCommit,
    image_url: Option<String>,
) -> QuestionCreate {
    let (part_id, passage_id) = match container {
        Container::Part(id) => (Some(id), None),
        Container::Passage(id) => (None, Some(id)),
        Container::Section(_) => (None, None),
    };
    QuestionCreate {
        section_id,
        part_id,
        passage_id,
        question_number: draft.question_number,
        question_type: draft.question_type.clone(),
        question_text: draft.question_text.clone(),
        order: draft.question_number as i32,
        instructions: draft.instructions.clone(),
        image_url,
        type_specific_data: commit.type_specific_data,
        answer_data: commit.answer_data,
    }
}

/// 题目创作服务
///
/// 职责：
/// - 上传草稿引用的本地媒体文件
/// - 创建听力 Part / 阅读文章
/// - 创建单道题目
/// - 创建写作/口语任务
#[derive(Clone)]
pub struct AuthoringService {
    client: ApiClient,
}

impl AuthoringService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 上传本地文件（相对路径基于 `base_dir`）
    pub async fn upload_media(&self, kind: UploadKind, base_dir: &Path, file: &str) -> Result<String> {
        self.client.upload_file(kind, &base_dir.join(file)).await
    }

    /// 创建题组的 Part 或文章
    ///
    /// 文件里已记录 `container_id` 时直接复用，不再重复创建；
    /// 写作/口语题组没有中间容器，任务挂在考试部分下。
    pub async fn create_container(&self, set: &QuestionSet, base_dir: &Path) -> Result<Container> {
        if let Some(container) = existing_container(set) {
            info!("♻️ 复用已创建的 {} {:?}", set.section_type.item_noun(), container);
            return Ok(container);
        }
        match set.section_type {
            SectionType::Listening => {
                let part = set.part.as_ref().ok_or_else(|| ValidationError::MissingDraft {
                    question_type: set.section_type.to_string(),
                    table: "part",
                })?;
                let audio_url = match (&part.audio_url, &part.audio_file) {
                    (Some(url), _) => url.clone(),
                    (None, Some(file)) => self.upload_media(UploadKind::Audio, base_dir, file).await?,
                    (None, None) => String::new(),
                };
                let created = self
                    .client
                    .create_listening_part(&ListeningPartCreate {
                        section_id: set.section_id,
                        part_number: part.part_number,
                        audio_url,
                        transcript: part.transcript.clone(),
                    })
                    .await?;
                info!("🎧 已创建听力 Part {} (ID {})", created.part_number, created.id);
                Ok(Container::Part(created.id))
            }
            SectionType::Reading => {
                let passage = set.passage.as_ref().ok_or_else(|| ValidationError::MissingDraft {
                    question_type: set.section_type.to_string(),
                    table: "passage",
                })?;
                let created = self
                    .client
                    .create_reading_passage(&ReadingPassageCreate {
                        section_id: set.section_id,
                        passage_number: passage.passage_number,
                        title: passage.title.clone(),
                        content: passage.content.clone(),
                        order: passage.order.unwrap_or(passage.passage_number as i32),
                        difficulty_level: passage.difficulty_level.clone(),
                        word_count: word_count(&passage.content) as u32,
                    })
                    .await?;
                info!("📖 已创建阅读文章 {} (ID {})", created.title, created.id);
                Ok(Container::Passage(created.id))
            }
            SectionType::Writing | SectionType::Speaking => Ok(Container::Section(set.section_id)),
        }
    }

    /// 创建题目
    pub async fn create_question(&self, container: Container, create: &QuestionCreate) -> Result<Question> {
        let created = match container {
            Container::Part(_) => self.client.create_listening_question(create).await?,
            Container::Passage(_) => self.client.create_reading_question(create).await?,
            Container::Section(section_id) => {
                return Err(ValidationError::UnsupportedSection(format!("考试部分 {}", section_id)).into())
            }
        };
        Ok(created)
    }

    /// 创建写作任务，本地图表先上传
    pub async fn create_writing_task(
        &self,
        section_id: i64,
        draft: &WritingTaskDraft,
        base_dir: &Path,
    ) -> Result<WritingTask> {
        // 上传前先校验草稿
        writing_task_create(section_id, draft, None)?;
        let image_url = match (&draft.image_url, &draft.image_file) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(file)) => Some(self.upload_media(UploadKind::Image, base_dir, file).await?),
            (None, None) => None,
        };
        let create = writing_task_create(section_id, draft, image_url)?;
        let created = self.client.create_writing_task(&create).await?;
        info!("✍️ 已创建写作 Task {} (ID {})", created.task_number, created.id);
        Ok(created)
    }

    /// 创建口语任务
    pub async fn create_speaking_task(&self, section_id: i64, draft: &SpeakingTaskDraft) -> Result<SpeakingTask> {
        let create = speaking_task_create(section_id, draft)?;
        let created = self.client.create_speaking_task(&create).await?;
        info!("🎤 已创建口语 Part {} (ID {})", created.part_number, created.id);
        Ok(created)
    }
}

/// 文件中记录的已创建容器
fn existing_container(set: &QuestionSet) -> Option<Container> {
    let id = set.container_id?;
    match set.section_type {
        SectionType::Listening => Some(Container::Part(id)),
        SectionType::Reading => Some(Container::Passage(id)),
        SectionType::Writing | SectionType::Speaking => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sheet::{PinDraft, StatementDraft};
    use crate::config::Config;
    use crate::session::Session;

    fn draft(question_type: &str) -> QuestionDraft {
        QuestionDraft {
            question_number: 3,
            question_type: question_type.into(),
            question_text: "Complete the form".into(),
            instructions: None,
            completion: None,
            table: None,
            matching: None,
            diagram: None,
            tfng: None,
            choice: None,
            short_answer: None,
        }
    }

    #[test]
    fn completion_draft_configures_each_blank() {
        let mut d = draft("listening_form_completion");
        d.completion = Some(CompletionDraft {
            template_text: "Name: [BLANK_1] Road: [BLANK_2]".into(),
            answers: BTreeMap::from([
                ("BLANK_1".to_string(), vec!["Smith".to_string()]),
                ("BLANK_2".to_string(), vec!["(North) Street".to_string()]),
            ]),
            max_words: BTreeMap::from([("BLANK_2".to_string(), 2)]),
            case_sensitive: vec!["BLANK_1".into()],
        });
        let commit = build_commit(&d, None).unwrap();
        assert_eq!(commit.type_specific_data["blanks"][0]["case_sensitive"], true);
        assert_eq!(commit.type_specific_data["blanks"][1]["max_words"], 2);
        assert_eq!(commit.answer_data["blanks"]["BLANK_2"][0], "(North) Street");
    }

    #[test]
    fn answers_for_unknown_blanks_are_rejected() {
        let mut d = draft("reading_sentence_completion");
        d.completion = Some(CompletionDraft {
            template_text: "The [BLANK_1] rises.".into(),
            answers: BTreeMap::from([("BLANK_9".to_string(), vec!["sun".to_string()])]),
            ..Default::default()
        });
        assert!(matches!(
            build_commit(&d, None),
            Err(AppError::Editor(EditorError::UnknownBlank(id))) if id == "BLANK_9"
        ));
    }

    #[test]
    fn missing_sub_table_names_it() {
        let d = draft("listening_matching");
        assert!(matches!(
            build_commit(&d, None),
            Err(AppError::Validation(ValidationError::MissingDraft { table: "matching", .. }))
        ));
    }

    #[test]
    fn table_draft_is_resized_to_fit() {
        let mut d = draft("reading_table_completion");
        d.table = Some(TableDraft {
            headers: vec!["Year".into(), "Event".into(), "Place".into()],
            rows: vec![
                vec!["1851".into(), "[BLANK_1]".into(), "London".into()],
                vec!["1889".into(), "Exhibition".into(), "[BLANK_2]".into()],
            ],
            answers: BTreeMap::from([
                ("BLANK_1".to_string(), vec!["Great Exhibition".to_string()]),
                ("BLANK_2".to_string(), vec!["Paris".to_string()]),
            ]),
            ..Default::default()
        });
        let commit = build_commit(&d, None).unwrap();
        assert_eq!(commit.type_specific_data["table_structure"]["headers"][2], "Place");
        assert_eq!(commit.type_specific_data["blanks"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn matching_draft_maps_items_to_labels() {
        let mut d = draft("reading_matching_headings");
        d.matching = Some(MatchingDraft {
            items: vec!["Paragraph A".into(), "Paragraph B".into()],
            options: vec!["Origins".into(), "Decline".into(), "Revival".into()],
            allow_option_reuse: false,
            mappings: BTreeMap::from([("1".to_string(), "c".to_string()), ("2".to_string(), "A".to_string())]),
        });
        let commit = build_commit(&d, None).unwrap();
        assert_eq!(commit.answer_data["mappings"]["1"], "C");
        assert_eq!(commit.type_specific_data["options"][2]["option_text"], "Revival");
    }

    #[test]
    fn diagram_needs_an_image_and_converts_pins() {
        let mut d = draft("listening_map_labeling");
        d.diagram = Some(DiagramDraft {
            image_url: None,
            image_file: None,
            image_size: [800.0, 400.0],
            max_words_per_label: None,
            pins: vec![PinDraft { x: 200.0, y: 100.0, answers: vec!["library".into()] }],
        });
        assert!(matches!(build_commit(&d, None), Err(AppError::Editor(EditorError::NoImage))));

        let commit = build_commit(&d, Some("/uploads/map.png")).unwrap();
        assert_eq!(commit.type_specific_data["labels"][0]["x"], 25.0);
        assert_eq!(commit.type_specific_data["labels"][0]["y"], 25.0);
        assert_eq!(commit.answer_data["labels"]["1"][0], "library");
    }

    #[test]
    fn tfng_statements_are_numbered_in_order() {
        let mut d = draft("reading_yes_no_not_given");
        d.tfng = Some(TfngDraft {
            answer_type: None,
            statements: vec![
                StatementDraft { text: "a".into(), answer: "yes".into() },
                StatementDraft { text: "b".into(), answer: "not given".into() },
            ],
        });
        let commit = build_commit(&d, None).unwrap();
        assert_eq!(commit.answer_data["answers"]["2"], "NOT GIVEN");
        assert_eq!(commit.type_specific_data["answer_type"], "yes_no_not_given");
    }

    #[test]
    fn single_select_with_two_answers_is_refused() {
        let mut d = draft("listening_multiple_choice");
        d.choice = Some(ChoiceDraft {
            options: vec!["a".into(), "b".into(), "c".into()],
            correct: vec!["A".into(), "B".into()],
            allow_multiple: false,
        });
        assert!(matches!(
            build_commit(&d, None),
            Err(AppError::Validation(ValidationError::SingleSelectAnswerCount(2)))
        ));
        d.choice.as_mut().unwrap().allow_multiple = true;
        let commit = build_commit(&d, None).unwrap();
        assert_eq!(commit.type_specific_data["options"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn unknown_type_becomes_free_text() {
        let mut d = draft("listening_legacy");
        d.short_answer = Some(ShortAnswerDraft {
            answers: vec!["forty".into(), "40".into()],
            max_words: None,
            case_sensitive: false,
        });
        let commit = build_commit(&d, None).unwrap();
        assert!(commit.type_specific_data.is_null());
        assert_eq!(commit.answer_data["correct_answer"], "forty");
        assert_eq!(commit.answer_data["alternative_answers"][0], "40");
    }

    #[test]
    fn create_request_points_at_its_container() {
        let d = draft("reading_short_answer");
        let commit = EditorCommit {
            type_specific_data: Value::Null,
            answer_data: Value::Null,
        };
        let create = to_create(2, Container::Passage(30), &d, commit, None);
        assert_eq!(create.passage_id, Some(30));
        assert_eq!(create.part_id, None);
        assert_eq!(create.order, 3);
    }

    #[test]
    fn writing_tasks_take_defaults_from_their_number() {
        let draft = WritingTaskDraft {
            task_number: 2,
            prompt_text: " Some people think... ".into(),
            ..Default::default()
        };
        let create = writing_task_create(4, &draft, None).unwrap();
        assert_eq!(create.task_type, "writing_task2_essay");
        assert_eq!(create.word_limit_min, 250);
        assert_eq!(create.time_limit_minutes, Some(40));
        assert_eq!(create.prompt_text, "Some people think...");

        let chart = WritingTaskDraft {
            task_number: 1,
            prompt_text: "The chart shows".into(),
            word_limit_min: Some(160),
            ..Default::default()
        };
        let create = writing_task_create(4, &chart, Some("/uploads/chart.png".into())).unwrap();
        assert_eq!(create.task_type, "writing_task1_academic");
        assert_eq!(create.word_limit_min, 160);
        assert_eq!(create.image_url.as_deref(), Some("/uploads/chart.png"));

        let bad = WritingTaskDraft { task_number: 3, prompt_text: "x".into(), ..Default::default() };
        assert_eq!(writing_task_create(4, &bad, None), Err(ValidationError::InvalidTaskNumber(3)));
    }

    #[test]
    fn only_part_two_carries_a_cue_card() {
        let cue = SpeakingTaskDraft {
            part_number: 2,
            prompt_text: "Describe a journey".into(),
            cue_card_points: vec!["where".into(), "  ".into(), "why".into()],
            ..Default::default()
        };
        let create = speaking_task_create(5, &cue).unwrap();
        assert_eq!(create.task_type, "speaking_part2");
        assert_eq!(create.preparation_time_seconds, Some(60));
        assert_eq!(create.speaking_time_seconds, 120);
        assert_eq!(create.cue_card_points, Some(vec!["where".to_string(), "why".to_string()]));

        let discussion = SpeakingTaskDraft {
            part_number: 3,
            prompt_text: "Why do people travel?".into(),
            cue_card_points: vec!["ignored".into()],
            ..Default::default()
        };
        let create = speaking_task_create(5, &discussion).unwrap();
        assert_eq!(create.preparation_time_seconds, Some(0));
        assert_eq!(create.speaking_time_seconds, 240);
        assert_eq!(create.order, 3);
        assert_eq!(create.cue_card_points, None);

        let empty = SpeakingTaskDraft { part_number: 1, ..Default::default() };
        assert_eq!(speaking_task_create(5, &empty), Err(ValidationError::EmptyPrompt(1)));
    }

    fn set(section_type: SectionType, container_id: Option<i64>) -> QuestionSet {
        QuestionSet {
            name: "Test 1".into(),
            section_id: 7,
            section_type,
            container_id,
            part: None,
            passage: None,
            questions: Vec::new(),
            writing_tasks: Vec::new(),
            speaking_tasks: Vec::new(),
            file_path: None,
        }
    }

    #[tokio::test]
    async fn recorded_container_is_reused_without_a_request() {
        // 未登录的客户端：任何真实请求都会失败
        let client = ApiClient::new(&Config::default(), Session::new("unused_token_file").into_shared()).unwrap();
        let authoring = AuthoringService::new(client);
        let base = Path::new(".");

        let container = authoring.create_container(&set(SectionType::Listening, Some(31)), base).await.unwrap();
        assert_eq!(container, Container::Part(31));
        let container = authoring.create_container(&set(SectionType::Reading, Some(32)), base).await.unwrap();
        assert_eq!(container, Container::Passage(32));
        let container = authoring.create_container(&set(SectionType::Writing, None), base).await.unwrap();
        assert_eq!(container, Container::Section(7));
        assert_eq!(container.created_id(), None);
    }
}
