//! Telegram texts and reply keyboards.

use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use teloxide::utils::html::escape;

use crate::study::{Locale, StudyConfig};
use crate::survey::conversation::parse_conversation;
use crate::survey::demographics::Field;
use crate::survey::onboarding::{Gate, Onboarding, Page};
use crate::survey::{ChoiceOption, QuestionItem};

pub struct Labels {
    pub next: &'static str,
    pub back: &'static str,
    pub agree: &'static str,
    pub complete: &'static str,
    pub consent_required: &'static str,
    pub participant_id_required: &'static str,
    pub quiz_incomplete: &'static str,
    pub loading: &'static str,
    pub unavailable: &'static str,
    pub question: &'static str,
    pub note: &'static str,
    pub use_buttons: &'static str,
    pub demographics_intro: &'static str,
    pub age: &'static str,
    pub gender: &'static str,
    pub race: &'static str,
    pub ethnicity: &'static str,
    pub completed: &'static str,
    pub already_completed: &'static str,
}

const EN: Labels = Labels {
    next: "Next",
    back: "Back",
    agree: "I agree",
    complete: "Complete",
    consent_required: "Please agree to the consent form to continue.",
    participant_id_required: "Please type your Prolific ID to continue.",
    quiz_incomplete: "Please answer every comprehension question.",
    loading: "Loading the survey...",
    unavailable: "The survey could not be loaded. Send any message to try again.",
    question: "Question",
    note: "Note",
    use_buttons: "Please choose one of the options below.",
    demographics_intro: "Thank you! Before you finish, please tell us a little about yourself.",
    age: "What is your age?",
    gender: "What is your gender?",
    race: "What is your race?",
    ethnicity: "What is your ethnicity?",
    completed: "Thank you for your participation! Your responses have been recorded. You can now return to Prolific.",
    already_completed: "You have already completed this survey. Thank you!",
};

const ZH: Labels = Labels {
    next: "下一步",
    back: "上一步",
    agree: "我同意",
    complete: "完成",
    consent_required: "请同意同意书以继续。",
    participant_id_required: "请输入您的Prolific ID以继续。",
    quiz_incomplete: "请回答所有理解问题。",
    loading: "正在加载问卷...",
    unavailable: "问卷加载失败。请发送任意消息重试。",
    question: "问题",
    note: "注释",
    use_buttons: "请从下面的选项中选择一个。",
    demographics_intro: "谢谢！在结束之前，请告诉我们一些关于您的信息。",
    age: "您的年龄是多少？",
    gender: "您的性别是什么？",
    race: "您的种族是什么？",
    ethnicity: "您的族裔是什么？",
    completed: "感谢您的参与！您的回答已被记录。您现在可以返回Prolific。",
    already_completed: "您已经完成了此问卷。谢谢！",
};

pub fn labels(locale: Locale) -> &'static Labels {
    match locale {
        Locale::En => &EN,
        Locale::Zh => &ZH,
    }
}

/// What a message means on an onboarding page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingInput {
    Next,
    Back,
    Consent,
    QuizAnswer { question: usize, value: String },
    Text(String),
}

pub fn parse_onboarding_input(text: &str, study: &StudyConfig) -> OnboardingInput {
    let labels = labels(study.locale);
    let text = text.trim();

    if text == labels.next || text == labels.complete {
        return OnboardingInput::Next;
    }
    if text == labels.back {
        return OnboardingInput::Back;
    }
    if text == labels.agree {
        return OnboardingInput::Consent;
    }
    if let Some((question, value)) = parse_quiz_button(text, study) {
        return OnboardingInput::QuizAnswer { question, value };
    }
    OnboardingInput::Text(text.to_string())
}

/// `"2. False"` -> question index 1 and the option's recorded value.
fn parse_quiz_button(text: &str, study: &StudyConfig) -> Option<(usize, String)> {
    let (number, label) = text.split_once(". ")?;
    let number: usize = number.parse().ok()?;
    if number == 0 || number > study.quiz.len() {
        return None;
    }
    let option = study.quiz_options.iter().find(|o| o.label == label)?;
    Some((number - 1, option.value.clone()))
}

fn quiz_button(question: usize, option: &ChoiceOption) -> String {
    format!("{}. {}", question + 1, option.label)
}

pub fn gate_message(gate: Gate, study: &StudyConfig) -> String {
    let labels = labels(study.locale);
    match gate {
        Gate::ConsentRequired => labels.consent_required.to_string(),
        Gate::ParticipantIdRequired => labels.participant_id_required.to_string(),
        Gate::QuizIncomplete => labels.quiz_incomplete.to_string(),
        Gate::QuizIncorrect => study.instructions.quiz_error.clone(),
    }
}

pub fn progress(current: usize, total: usize) -> String {
    format!("({}/{})", current, total)
}

pub fn onboarding_text(flow: &Onboarding, study: &StudyConfig) -> String {
    let (current, total) = flow.progress();
    let instructions = &study.instructions;
    let mut text = format!("{}\n\n", progress(current, total));

    match flow.page() {
        Page::Consent => {
            text.push_str(&instructions.consent);
            if flow.consent() {
                text.push_str("\n\n✓ ");
                text.push_str(labels(study.locale).agree);
            }
        }
        Page::ParticipantId => {
            text.push_str(&instructions.participant_id);
            if !flow.participant_id().is_empty() {
                text.push_str("\n\nID: ");
                text.push_str(flow.participant_id());
            }
        }
        Page::Introduction => text.push_str(&instructions.introduction),
        Page::Choices => text.push_str(&instructions.choices),
        Page::ComprehensionQuiz => {
            text.push_str(&instructions.quiz_intro);
            for (index, question) in study.quiz.iter().enumerate() {
                text.push_str("\n\n");
                text.push_str(&question.text);
                let chosen = flow
                    .quiz_answer(index)
                    .and_then(|value| study.quiz_options.iter().find(|o| o.value == value));
                if let Some(option) = chosen {
                    text.push_str("\n→ ");
                    text.push_str(&option.label);
                }
            }
            if flow.shows_quiz_error() {
                text.push_str("\n\n");
                text.push_str(&instructions.quiz_error);
            }
        }
    }
    text
}

pub fn onboarding_keyboard(page: Page, study: &StudyConfig) -> KeyboardMarkup {
    let labels = labels(study.locale);
    let mut rows: Vec<Vec<KeyboardButton>> = Vec::new();

    match page {
        Page::Consent => {
            rows.push(vec![KeyboardButton::new(labels.agree)]);
            rows.push(vec![KeyboardButton::new(labels.next)]);
        }
        Page::ComprehensionQuiz => {
            for index in 0..study.quiz.len() {
                rows.push(
                    study
                        .quiz_options
                        .iter()
                        .map(|option| KeyboardButton::new(quiz_button(index, option)))
                        .collect(),
                );
            }
            rows.push(vec![
                KeyboardButton::new(labels.back),
                KeyboardButton::new(labels.complete),
            ]);
        }
        _ => rows.push(vec![
            KeyboardButton::new(labels.back),
            KeyboardButton::new(labels.next),
        ]),
    }

    KeyboardMarkup::new(rows).resize_keyboard(true)
}

/// HTML body for a questionnaire item.
pub fn question_text(item: &QuestionItem, number: usize, total: usize, study: &StudyConfig) -> String {
    let labels = labels(study.locale);
    let mut text = format!("<b>{} {}</b>\n\n", labels.question, progress(number, total));

    let turns = parse_conversation(&item.statement_text);
    if turns.is_empty() {
        text.push_str(&escape(&item.statement_text));
    } else {
        let lines: Vec<String> = turns
            .iter()
            .map(|turn| format!("<b>{}:</b> {}", turn.speaker, escape(&turn.content)))
            .collect();
        text.push_str(&lines.join("\n"));
    }

    if !item.note.trim().is_empty() {
        text.push_str(&format!("\n\n<i>{}: {}</i>", labels.note, escape(&item.note)));
    }
    if !item.prompt_text.trim().is_empty() {
        text.push_str(&format!("\n\n<b>{}</b>", escape(&item.prompt_text)));
    }
    text
}

pub fn options_keyboard(options: &[ChoiceOption]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        options
            .iter()
            .map(|option| vec![KeyboardButton::new(option.label.clone())]),
    )
    .resize_keyboard(true)
}

pub fn demographics_prompt(field: Field, study: &StudyConfig) -> &'static str {
    let labels = labels(study.locale);
    match field {
        Field::Age => labels.age,
        Field::Gender => labels.gender,
        Field::Race => labels.race,
        Field::Ethnicity => labels.ethnicity,
    }
}

/// Age is typed; every other field is answered with buttons.
pub fn demographics_keyboard(field: Field) -> ReplyMarkup {
    match field {
        Field::Age => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
        _ => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(
                field
                    .option_labels()
                    .into_iter()
                    .map(|label| vec![KeyboardButton::new(label)]),
            )
            .resize_keyboard(true),
        ),
    }
}

pub fn remove_keyboard() -> ReplyMarkup {
    ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
}
