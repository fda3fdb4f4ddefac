//! 教师评分服务 - 业务能力层

use std::collections::HashSet;
use tracing::{info, warn};

use crate::clients::ApiClient;
use crate::error::Result;
use crate::models::grade::GradeRecord;
use crate::models::sheet::{SpeakingGradeEntry, WritingGradeEntry};
use crate::models::GradeSheet;

/// 一张评分表的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeStats {
    pub graded: usize,
    /// 分数越界或不在待评分列表中
    pub rejected: usize,
    pub failed: usize,
}

impl GradeStats {
    pub fn total(&self) -> usize {
        self.graded + self.rejected + self.failed
    }
}

/// 教师评分服务
///
/// 职责：
/// - 拉取待评分的写作/口语提交
/// - 校验分数并提交评分
#[derive(Clone)]
pub struct GradingService {
    client: ApiClient,
}

impl GradingService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// 处理一张评分表，单条失败不影响其它条目
    pub async fn apply_sheet(&self, sheet: &GradeSheet) -> Result<GradeStats> {
        let pending_writing: HashSet<i64> = self.client.pending_writing().await?.into_iter().map(|p| p.id).collect();
        let pending_speaking: HashSet<i64> =
            self.client.pending_speaking().await?.into_iter().map(|p| p.id).collect();
        info!(
            "📋 待评分: 写作 {} 份, 口语 {} 份",
            pending_writing.len(),
            pending_speaking.len()
        );

        let mut stats = GradeStats::default();
        for entry in &sheet.writing {
            tally(&mut stats, self.grade_writing(entry, &pending_writing).await);
        }
        for entry in &sheet.speaking {
            tally(&mut stats, self.grade_speaking(entry, &pending_speaking).await);
        }
        Ok(stats)
    }

    async fn grade_writing(&self, entry: &WritingGradeEntry, pending: &HashSet<i64>) -> Outcome {
        if !pending.contains(&entry.submission_id) {
            warn!("⚠️  写作提交 {} 不在待评分列表中", entry.submission_id);
            return Outcome::Rejected;
        }
        if let Err(e) = entry.grade.validate() {
            warn!("⚠️  写作提交 {} 评分无效: {}", entry.submission_id, e);
            return Outcome::Rejected;
        }
        let local = entry.grade.overall();
        self.report(
            "写作",
            entry.submission_id,
            local,
            self.client.grade_writing(entry.submission_id, &entry.grade).await,
        )
    }

    async fn grade_speaking(&self, entry: &SpeakingGradeEntry, pending: &HashSet<i64>) -> Outcome {
        if !pending.contains(&entry.submission_id) {
            warn!("⚠️  口语提交 {} 不在待评分列表中", entry.submission_id);
            return Outcome::Rejected;
        }
        if let Err(e) = entry.grade.validate() {
            warn!("⚠️  口语提交 {} 评分无效: {}", entry.submission_id, e);
            return Outcome::Rejected;
        }
        let local = entry.grade.overall();
        self.report(
            "口语",
            entry.submission_id,
            local,
            self.client.grade_speaking(entry.submission_id, &entry.grade).await,
        )
    }

    fn report(
        &self,
        kind: &str,
        submission_id: i64,
        local: f64,
        result: std::result::Result<GradeRecord, crate::error::ApiError>,
    ) -> Outcome {
        match result {
            Ok(record) => {
                if (record.overall_band_score - local).abs() > f64::EPSILON {
                    warn!(
                        "⚠️  {}提交 {} 服务端总分 {} 与本地计算 {} 不一致",
                        kind, submission_id, record.overall_band_score, local
                    );
                }
                info!("✅ {}提交 {} 已评分: Band {}", kind, submission_id, record.overall_band_score);
                Outcome::Graded
            }
            Err(e) => {
                warn!("❌ {}提交 {} 评分失败: {}", kind, submission_id, e);
                Outcome::Failed
            }
        }
    }
}

enum Outcome {
    Graded,
    Rejected,
    Failed,
}

fn tally(stats: &mut GradeStats, outcome: Outcome) {
    match outcome {
        Outcome::Graded => stats.graded += 1,
        Outcome::Rejected => stats.rejected += 1,
        Outcome::Failed => stats.failed += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_add_up() {
        let mut stats = GradeStats::default();
        tally(&mut stats, Outcome::Graded);
        tally(&mut stats, Outcome::Rejected);
        tally(&mut stats, Outcome::Graded);
        assert_eq!(stats, GradeStats { graded: 2, rejected: 1, failed: 0 });
        assert_eq!(stats.total(), 3);
    }
}
