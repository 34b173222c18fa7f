//! Template kinds and prompt assembly.
//!
//! Assembles the lesson form into the request text for one of the five
//! document kinds. This module contains pure logic (no I/O).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalog::CatalogError;
use super::config::{AudienceTier, LessonConfig};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The document a teacher asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    LessonPlan,
    Slideshow,
    Quiz,
    ReviewOutline,
    InteractiveGame,
}

impl TemplateKind {
    /// All kinds in the order they appear in the template bar.
    pub const ALL: [TemplateKind; 5] = [
        Self::LessonPlan,
        Self::Slideshow,
        Self::Quiz,
        Self::ReviewOutline,
        Self::InteractiveGame,
    ];

    /// Kebab-case identifier used on the command line and in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LessonPlan => "lesson-plan",
            Self::Slideshow => "slideshow",
            Self::Quiz => "quiz",
            Self::ReviewOutline => "review-outline",
            Self::InteractiveGame => "interactive-game",
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::LessonPlan => "Soạn giáo án",
            Self::Slideshow => "Slide bài giảng",
            Self::Quiz => "Đề kiểm tra",
            Self::ReviewOutline => "Đề cương ôn tập",
            Self::InteractiveGame => "Trò chơi tương tác",
        }
    }

    /// Whether this kind has a prompt body. Only the lesson plan does.
    pub fn has_body(self) -> bool {
        matches!(self, Self::LessonPlan)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lesson-plan" | "giaoan" => Ok(Self::LessonPlan),
            "slideshow" | "ppt" => Ok(Self::Slideshow),
            "quiz" | "kiemtra" => Ok(Self::Quiz),
            "review-outline" | "ontap" => Ok(Self::ReviewOutline),
            "interactive-game" | "trochoi" => Ok(Self::InteractiveGame),
            _ => Err(CatalogError::UnknownTemplate(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Lesson plan template
// ---------------------------------------------------------------------------

/// Role description and required structure for a lesson plan.
const LESSON_PLAN_PREAMBLE: &str = "\
Bạn là giáo viên cốt cán, chuyên gia xây dựng kế hoạch bài dạy theo Chương trình Giáo dục phổ thông 2018.
Hãy soạn KẾ HOẠCH BÀI DẠY hoàn chỉnh với cấu trúc bắt buộc:
I. MỤC TIÊU (1. Kiến thức; 2. Năng lực; 3. Phẩm chất)
II. THIẾT BỊ DẠY HỌC VÀ HỌC LIỆU
III. TIẾN TRÌNH DẠY HỌC
- Hoạt động 1: Mở đầu
- Hoạt động 2: Hình thành kiến thức mới
- Hoạt động 3: Luyện tập
- Hoạt động 4: Vận dụng
Mỗi hoạt động ghi rõ: a) Mục tiêu; b) Nội dung; c) Sản phẩm; d) Tổ chức thực hiện.
Lồng ghép bắt buộc: năng lực số, giáo dục kỹ năng sống, giáo dục bảo vệ môi trường.
Định dạng: chỉ dùng thẻ HTML <h2>, <h3>, <p>, <ul>, <li>, <b>, <table>; không dùng Markdown.
";

/// Clause appended for [`AudienceTier::Standard`].
pub const STANDARD_CLAUSE: &str = "\
Tuân thủ hướng dẫn của Công văn 5512/BGDĐT-GDTrH về xây dựng kế hoạch bài dạy \
theo định hướng phát triển phẩm chất, năng lực học sinh.";

/// Clause appended for [`AudienceTier::InclusiveNeeds`].
pub const INCLUSIVE_CLAUSE: &str = "\
Điều chỉnh cho học sinh hòa nhập: giảm 50% độ khó của kiến thức, \
dùng từ ngữ đơn giản, câu ngắn, dễ hiểu.";

fn audience_clause(tier: AudienceTier) -> &'static str {
    match tier {
        AudienceTier::Standard => STANDARD_CLAUSE,
        AudienceTier::InclusiveNeeds => INCLUSIVE_CLAUSE,
    }
}

fn lesson_plan_prompt(config: &LessonConfig) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(LESSON_PLAN_PREAMBLE);
    prompt.push_str(audience_clause(config.audience));
    prompt.push('\n');
    prompt.push_str(&format!(
        "Thông tin bài dạy: Môn {subject}, {grade}, bài \"{title}\", thời lượng {periods} tiết, đối tượng: {audience}.",
        subject = config.subject,
        grade = config.grade,
        title = config.title_or_placeholder(),
        periods = config.period_count_or_default(),
        audience = config.audience.label(),
    ));

    prompt
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Expand a template against the current form.
///
/// Only [`TemplateKind::LessonPlan`] has a body; the other kinds return an
/// empty string and the teacher is expected to type the prompt by hand.
pub fn build_prompt(kind: TemplateKind, config: &LessonConfig) -> String {
    match kind {
        TemplateKind::LessonPlan => lesson_plan_prompt(config),
        TemplateKind::Slideshow
        | TemplateKind::Quiz
        | TemplateKind::ReviewOutline
        | TemplateKind::InteractiveGame => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
