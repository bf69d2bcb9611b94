//! Built-in study variants.

use std::collections::BTreeMap;

use super::{
    AttentionCheck, ChoiceOrder, ChoiceSet, DatasetColumns, Instructions, Locale, QuizQuestion,
    StudyConfig, DEFAULT_BUNDLE_COLLECTION,
};
use crate::survey::ChoiceOption;

pub const DEFAULT_STUDY: &str = "semeval-sentiment";
pub const NAMES: [&str; 5] = [
    "semeval-sentiment",
    "sims-ch",
    "cstance-ch",
    "isarcasm",
    "emobench",
];

pub fn by_name(name: &str) -> Option<StudyConfig> {
    match name {
        "semeval-sentiment" => Some(semeval_sentiment()),
        "sims-ch" => Some(sims_ch()),
        "cstance-ch" => Some(cstance_ch()),
        "isarcasm" => Some(isarcasm()),
        "emobench" => Some(emobench()),
        _ => None,
    }
}

fn options(pairs: &[(&str, &str)]) -> Vec<ChoiceOption> {
    pairs
        .iter()
        .map(|(label, value)| ChoiceOption::new(*label, *value))
        .collect()
}

/// Options whose recorded value is the label itself.
fn plain(labels: &[&str]) -> Vec<ChoiceOption> {
    labels.iter().map(|l| ChoiceOption::new(*l, *l)).collect()
}

fn check(prompt: &str, statement: &str, note: &str, correct_answer: &str) -> AttentionCheck {
    AttentionCheck {
        prompt: prompt.to_string(),
        statement: statement.to_string(),
        note: note.to_string(),
        correct_answer: correct_answer.to_string(),
    }
}

fn quiz(questions: &[(&str, &str)]) -> Vec<QuizQuestion> {
    questions
        .iter()
        .map(|(text, correct)| QuizQuestion {
            text: text.to_string(),
            correct: correct.to_string(),
        })
        .collect()
}

fn per_dataset(sets: Vec<(&str, Vec<ChoiceOption>)>) -> BTreeMap<String, Vec<ChoiceOption>> {
    sets.into_iter()
        .map(|(name, options)| (name.to_string(), options))
        .collect()
}

fn true_false_en() -> Vec<ChoiceOption> {
    options(&[("True", "True"), ("False", "False")])
}

fn true_false_zh() -> Vec<ChoiceOption> {
    options(&[("正确", "True"), ("错误", "False")])
}

fn quiz_options_en() -> Vec<ChoiceOption> {
    options(&[("True", "true"), ("False", "false")])
}

fn quiz_options_zh() -> Vec<ChoiceOption> {
    options(&[("正确", "true"), ("错误", "false")])
}

const CONSENT_EN: &str = "Consent Form\n\nYour data will be used for analysis in a research project and will be used in a publication in a fully anonymized manner.\n\nPress \"I agree\" if you have read and understood the information above and agree to participate in this study.";
const PARTICIPANT_ID_EN: &str = "Prolific ID\n\nPlease type your Prolific ID to continue.";
const QUIZ_INTRO_EN: &str = "Comprehension Quiz\n\nAnswer every statement with True or False.";
const QUIZ_ERROR_EN: &str =
    "One of the comprehension answers is incorrect. Please double check the answers!";

const CONSENT_ZH: &str = "同意书\n\n您的数据将用于一个研究项目的分析，并将在一篇以完全匿名化方式发表的文章中使用。\n\n如果您已阅读并理解上述信息，并同意参与此研究，请点击“我同意”。";
const PARTICIPANT_ID_ZH: &str = "Prolific ID\n\n请输入您的Prolific ID以继续。";
const QUIZ_INTRO_ZH: &str = "理解测验\n\n请判断以下每个陈述是正确还是错误。";
const QUIZ_ERROR_ZH: &str = "有一个理解问题回答不正确。请仔细检查答案！";

pub fn semeval_sentiment() -> StudyConfig {
    let choice = |labels: [&str; 4]| -> Vec<ChoiceOption> {
        labels
            .iter()
            .map(|label| ChoiceOption::new(*label, label.to_lowercase()))
            .collect()
    };
    let set_4 = choice(["Ambiguous", "Positive", "Negative", "Neutral"]);

    StudyConfig {
        name: "semeval-sentiment".to_string(),
        tag: "Full-SemT6_Sentiment".to_string(),
        dataset: "data/set_4.csv".to_string(),
        locale: Locale::En,
        columns: DatasetColumns::default(),
        prompt_template:
            "What was the person's sentiment when they said \"{source}\" during the conversation?"
                .to_string(),
        attention_checks: vec![
            check(
                "Please determine if the following statement is true or false.",
                "1 + 1 = 2",
                "",
                "True",
            ),
            check(
                "Please determine if the following statement is true or false.",
                "Mary was excited about her vacation, but had to cancel it due to work. Mary is likely to feel excited about this situation.",
                "",
                "False",
            ),
            check(" ", "Please select 'False'", "", "False"),
            check(
                "Please determine if the following statement is true or false.",
                "John believes vaccines are effective at preventing diseases. John is likely to support vaccination programs.",
                "",
                "True",
            ),
        ],
        attention_options: true_false_en(),
        choices: ChoiceSet {
            options: set_4.clone(),
            per_dataset: per_dataset(vec![
                ("set_4.csv", set_4),
                ("set_5.csv", choice(["Negative", "Positive", "Neutral", "Ambiguous"])),
                ("set_6.csv", choice(["Neutral", "Ambiguous", "Positive", "Negative"])),
            ]),
            order: ChoiceOrder::Fixed,
        },
        collection_template: "{tag}-{set}-{participant}".to_string(),
        bundle_collection: DEFAULT_BUNDLE_COLLECTION.to_string(),
        instructions: Instructions {
            consent: CONSENT_EN.to_string(),
            participant_id: PARTICIPANT_ID_EN.to_string(),
            introduction: "Instructions 1/2: Introduction\n\nWelcome to this sentiment recognition experiment!\n\nIn this study, you will be presented a conversation containing a statement and your task is to judge if the sentiment of the statement is positive, negative or neutral.\n\nIMPORTANT NOTE: Please read all instructions carefully and thoroughly. At the end of the instructions, you will be asked comprehension questions to ensure you have fully understood the task.".to_string(),
            choices: "Instructions 2/2: Choices\n\nFor each statement, you will choose from the following:\n\nPositive\nNegative\nNeutral\nAmbiguous: if you cannot determine the sentiment of the statement without more context, or if you do not understand the statement.".to_string(),
            quiz_intro: QUIZ_INTRO_EN.to_string(),
            quiz_error: QUIZ_ERROR_EN.to_string(),
        },
        quiz: quiz(&[
            ("1. The main objective of this experiment is to identify if the sentiment of a statement is positive, negative or neutral.", "true"),
            ("2. When you do not understand the statement, just select \"Neutral\" as the answer.", "false"),
            ("3. When you think the sentiment of the statement is ambiguous and cannot be determined without more context, you should select \"Ambiguous\".", "true"),
        ]),
        quiz_options: quiz_options_en(),
        collect_race_ethnicity: true,
    }
}

pub fn sims_ch() -> StudyConfig {
    let set_4 = plain(&["模糊", "积极", "消极", "中性"]);

    StudyConfig {
        name: "sims-ch".to_string(),
        tag: "Full-SIMS-ch".to_string(),
        dataset: "data/set_4.csv".to_string(),
        locale: Locale::Zh,
        columns: DatasetColumns::default(),
        prompt_template: "当一个人在对话中说\"{source}\"时，他们的情感是什么？".to_string(),
        attention_checks: vec![
            check("请确定以下陈述是正确还是错误的。", "1 + 1 = 2", "", "True"),
            check(
                "请确定以下陈述是正确还是错误的。",
                "玛丽对她的假期感到兴奋，但由于工作不得不取消。玛丽对这种情况可能感到兴奋。",
                "",
                "False",
            ),
            check(" ", "请选择‘错误’", "", "False"),
            check(
                "请确定以下陈述是正确还是错误的。",
                "约翰认为疫苗在预防疾病方面是有效的。约翰可能会支持疫苗接种计划。",
                "",
                "True",
            ),
        ],
        attention_options: true_false_zh(),
        choices: ChoiceSet {
            options: set_4.clone(),
            per_dataset: per_dataset(vec![
                ("set_4.csv", set_4),
                ("set_5.csv", plain(&["消极", "积极", "中性", "模糊"])),
                ("set_6.csv", plain(&["中性", "积极", "消极", "模糊"])),
            ]),
            order: ChoiceOrder::Fixed,
        },
        collection_template: "{tag}-{set}-{participant}".to_string(),
        bundle_collection: DEFAULT_BUNDLE_COLLECTION.to_string(),
        instructions: Instructions {
            consent: CONSENT_ZH.to_string(),
            participant_id: PARTICIPANT_ID_ZH.to_string(),
            introduction: "说明 1/2：简介\n\n欢迎参加此情感识别实验！\n\n在这项研究中，您将会看到一段对话，其中包含一个陈述。您的任务是识别该陈述的情感是积极的、消极的还是中性的。\n\n我们的目标是了解人们在对话中识别陈述背后的情感的能力。\n\n重要提示：请仔细阅读所有说明。在说明的最后，您将被要求回答理解问题，以确保您完全理解了任务和您在此实验中的角色。".to_string(),
            choices: "说明 2/2：选择\n\n对于每个陈述，您将从以下选项中进行选择：\n\n积极的\n消极的\n中性的\n模糊的：如果您不能在没有更多上下文的情况下确定陈述的情感，或者如果您不理解该陈述。".to_string(),
            quiz_intro: QUIZ_INTRO_ZH.to_string(),
            quiz_error: QUIZ_ERROR_ZH.to_string(),
        },
        quiz: quiz(&[
            ("1. 本实验的主要目的是识别陈述的情感是积极的、消极的还是中性的。", "true"),
            ("2. 当您不理解陈述时，只需选择“中性”作为答案。", "false"),
            ("3. 当您认为陈述的情感是模糊的，并且在没有更多上下文的情况下无法确定时，您应该选择“模糊”。", "true"),
        ]),
        quiz_options: quiz_options_zh(),
        collect_race_ethnicity: true,
    }
}

pub fn cstance_ch() -> StudyConfig {
    let base = plain(&["反对", "支持", "中立", "模糊"]);

    StudyConfig {
        name: "cstance-ch".to_string(),
        tag: "CSTANCE-ch".to_string(),
        dataset: "data/set_1.csv".to_string(),
        locale: Locale::Zh,
        columns: DatasetColumns::default(),
        prompt_template:
            "当一个人在对话中说\"{source}\"时，他对于这个话题：\"{label}\"的态度是,".to_string(),
        attention_checks: sims_ch().attention_checks,
        attention_options: true_false_zh(),
        choices: ChoiceSet {
            options: base.clone(),
            per_dataset: per_dataset(vec![
                ("set_1.csv", base.clone()),
                ("set_2.csv", base.clone()),
                ("set_3.csv", base),
                ("set_4.csv", plain(&["模糊", "中立", "支持", "反对"])),
                ("set_5.csv", plain(&["中立", "模糊", "反对", "支持"])),
                ("set_6.csv", plain(&["支持", "中立", "反对", "模糊"])),
            ]),
            order: ChoiceOrder::Fixed,
        },
        collection_template: "{tag}-{set}-{participant}".to_string(),
        bundle_collection: DEFAULT_BUNDLE_COLLECTION.to_string(),
        instructions: Instructions {
            consent: CONSENT_ZH.to_string(),
            participant_id: PARTICIPANT_ID_ZH.to_string(),
            introduction: "说明 1/2：简介\n\n欢迎参加此立场识别实验！\n\n在这项研究中，您将会看到一段对话，其中包含一个陈述和一个话题。您的任务是判断说话者对该话题的态度是支持、反对还是中立。\n\n重要提示：请仔细阅读所有说明。在说明的最后，您将被要求回答理解问题。".to_string(),
            choices: "说明 2/2：选择\n\n对于每个陈述，您将从以下选项中进行选择：\n\n支持\n反对\n中立\n模糊：如果您不能在没有更多上下文的情况下确定说话者的态度，或者如果您不理解该陈述。".to_string(),
            quiz_intro: QUIZ_INTRO_ZH.to_string(),
            quiz_error: QUIZ_ERROR_ZH.to_string(),
        },
        quiz: quiz(&[
            ("1. 本实验的主要目的是判断说话者对话题的态度是支持、反对还是中立。", "true"),
            ("2. 当您不理解陈述时，只需选择“中立”作为答案。", "false"),
            ("3. 当您无法确定说话者的态度时，您应该选择“模糊”。", "true"),
        ]),
        quiz_options: quiz_options_zh(),
        collect_race_ethnicity: true,
    }
}

fn sarcasm_instructions() -> Instructions {
    Instructions {
        consent: CONSENT_EN.to_string(),
        participant_id: PARTICIPANT_ID_EN.to_string(),
        introduction: "Instructions 1/2: Introduction\n\nWelcome to this intent recognition experiment!\n\nIn this study, you will be presented a conversation containing a statement and your task is to judge if the statement is sarcastic or not sarcastic in the context of the conversation.\n\nOur goal is to find out how well people can recognize the intent behind a statement in a conversation.\n\nIMPORTANT NOTE: Please read all instructions carefully and thoroughly. At the end of the instructions, you will be asked comprehension questions to ensure you have fully understood the task and your role in this experiment.".to_string(),
        choices: "Instructions 2/2: Choices\n\nFor each statement, you will choose from the following:\n\nTrue: if the statement is sarcastic given the conversation.\nFalse: if the statement is not sarcastic given the conversation.\nAmbiguous: if you cannot determine if the statement is sarcastic or not, or if you do not understand the statement given the conversation.".to_string(),
        quiz_intro: QUIZ_INTRO_EN.to_string(),
        quiz_error: QUIZ_ERROR_EN.to_string(),
    }
}

fn sarcasm_quiz() -> Vec<QuizQuestion> {
    quiz(&[
        ("1. The main objective of this experiment is to identify if the sentiment of a statement is positive or negative.", "false"),
        ("2. When you do not understand the statement, just select \"not sarcastic\" as the answer.", "false"),
        ("3. When you think the statement is ambiguous and can be either sarcastic or not sarcastic, you should select \"ambiguous\".", "true"),
    ])
}

const SARCASM_PROMPT: &str =
    "Was the person intended to be sarcastic when \"{source}\" was said during the conversation?";

pub fn isarcasm() -> StudyConfig {
    let note = "YOU SHOULD NOT SELECT Ambiguous.";

    StudyConfig {
        name: "isarcasm".to_string(),
        tag: "iSarcasm".to_string(),
        dataset: "data/interactive.csv".to_string(),
        locale: Locale::En,
        columns: DatasetColumns::default(),
        prompt_template: SARCASM_PROMPT.to_string(),
        attention_checks: vec![
            check(
                "Please determine if the following statement is true or false.",
                "1 + 1 = 2",
                note,
                "True",
            ),
            check(
                "Please determine if the following statement is true or false.",
                "Texas is the capital of the United States.",
                note,
                "False",
            ),
            check(
                "Please determine if the following statement is true or false.",
                "The sun rises from the north and sets at the west.",
                note,
                "False",
            ),
        ],
        attention_options: options(&[
            ("True", "True"),
            ("False", "False"),
            ("Ambiguous", "Ambiguous"),
        ]),
        choices: ChoiceSet {
            options: options(&[
                ("True: the statement is sarcastic", "True"),
                ("False: the statement is not sarcastic", "False"),
                ("Ambiguous: I am not sure if this is sarcastic or not", "Ambiguous"),
            ]),
            per_dataset: BTreeMap::new(),
            order: ChoiceOrder::Fixed,
        },
        collection_template: "{participant}".to_string(),
        bundle_collection: DEFAULT_BUNDLE_COLLECTION.to_string(),
        instructions: sarcasm_instructions(),
        quiz: sarcasm_quiz(),
        quiz_options: quiz_options_en(),
        collect_race_ethnicity: true,
    }
}

/// Sarcasm study without the ambiguous option.
pub fn emobench() -> StudyConfig {
    StudyConfig {
        name: "emobench".to_string(),
        tag: "iSarcasm-No-Amb".to_string(),
        dataset: "data/interactive.csv".to_string(),
        locale: Locale::En,
        columns: DatasetColumns::default(),
        prompt_template: SARCASM_PROMPT.to_string(),
        attention_checks: vec![
            check("", "Is 1 + 1 = 2 true? Select your answer below.", "", "True"),
            check("", "Please select 'True'.", "", "True"),
            check("", "Please select 'False'", "", "False"),
        ],
        attention_options: true_false_en(),
        choices: ChoiceSet {
            options: options(&[
                ("True: the statement is sarcastic", "True"),
                ("False: the statement is not sarcastic", "False"),
            ]),
            per_dataset: BTreeMap::new(),
            order: ChoiceOrder::Fixed,
        },
        collection_template: "{tag}-{participant}".to_string(),
        bundle_collection: DEFAULT_BUNDLE_COLLECTION.to_string(),
        instructions: sarcasm_instructions(),
        quiz: sarcasm_quiz(),
        quiz_options: quiz_options_en(),
        collect_race_ethnicity: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_preset_is_valid() {
        for name in NAMES {
            let study = by_name(name).unwrap();
            assert_eq!(study.name, name);
            study.validate().unwrap();
            assert!(!study.attention_checks.is_empty());
            assert!(!study.quiz.is_empty());
        }
        assert!(by_name("politeness").is_none());
    }

    #[test]
    fn quiz_answers_are_offered_options() {
        for name in NAMES {
            let study = by_name(name).unwrap();
            for question in &study.quiz {
                assert!(
                    study.quiz_options.iter().any(|o| o.value == question.correct),
                    "{name}: {}",
                    question.text
                );
            }
        }
    }

    #[test]
    fn attention_answers_are_offered_options() {
        for name in NAMES {
            let study = by_name(name).unwrap();
            for check in &study.attention_checks {
                assert!(study
                    .attention_options
                    .iter()
                    .any(|o| o.value == check.correct_answer));
            }
        }
    }

    #[test]
    fn collection_names_follow_each_variant() {
        assert_eq!(
            semeval_sentiment().collection_name("P1"),
            "Full-SemT6_Sentiment-4-P1"
        );
        assert_eq!(sims_ch().collection_name("P1"), "Full-SIMS-ch-4-P1");
        assert_eq!(cstance_ch().collection_name("P1"), "CSTANCE-ch-1-P1");
        assert_eq!(isarcasm().collection_name("P1"), "P1");
        assert_eq!(emobench().collection_name("P1"), "iSarcasm-No-Amb-P1");
    }

    #[test]
    fn dataset_choices_have_unique_labels() {
        for name in NAMES {
            let study = by_name(name).unwrap();
            let sets = std::iter::once(&study.choices.options)
                .chain(study.choices.per_dataset.values());
            for options in sets {
                let mut labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
                labels.sort_unstable();
                labels.dedup();
                assert_eq!(labels.len(), options.len(), "{name}");
            }
        }
    }

    fn sentiment_en() -> Vec<ChoiceOption> {
        options(&[
            ("Positive", "positive"),
            ("Negative", "negative"),
            ("Neutral", "neutral"),
            ("Ambiguous", "ambiguous"),
        ])
    }

    #[test]
    fn sentiment_values_are_lowercase() {
        assert_eq!(semeval_sentiment().choices.options.len(), sentiment_en().len());
        for option in semeval_sentiment().choices.options {
            assert!(sentiment_en().contains(&option));
        }
    }
}
