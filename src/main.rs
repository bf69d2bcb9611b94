mod config;
mod error;
mod messages;
mod store;
mod study;
mod survey;

use std::sync::Arc;

use dotenv::dotenv;
use log::{debug, error, info, warn};
use teloxide::{
    dispatching::{dialogue::InMemStorage, UpdateHandler},
    prelude::*,
    types::ParseMode,
};

use config::AppConfig;
use messages::{labels, OnboardingInput};
use store::{DocumentStore, FirestoreStore, MemoryStore};
use study::StudyConfig;
use survey::dataset::DatasetLoader;
use survey::demographics::{submit_survey, survey_bundle, DemographicsForm};
use survey::onboarding::{AnswerKey, Gate, Onboarding, Page, Step};
use survey::session::ParticipantSession;
use survey::Phase;

type SurveyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    Onboarding {
        flow: Onboarding,
        session: ParticipantSession,
    },
    Questionnaire {
        session: ParticipantSession,
    },
    Demographics {
        session: ParticipantSession,
        form: DemographicsForm,
    },
    Completed,
}

/// Everything the handlers share for the configured study.
struct Survey {
    study: StudyConfig,
    answer_key: AnswerKey,
    loader: DatasetLoader,
    store: Arc<dyn DocumentStore>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    info!("Starting survey bot...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    info!(
        "Study \"{}\" with dataset {}",
        config.study.name, config.study.dataset
    );

    let client = reqwest::Client::new();
    let store: Arc<dyn DocumentStore> = match config.firestore {
        Some(settings) => {
            info!("Writing responses to Firestore project {}", settings.project_id);
            Arc::new(FirestoreStore::new(client.clone(), settings))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let survey = Arc::new(Survey {
        answer_key: config.study.answer_key(),
        study: config.study,
        loader: DatasetLoader::new(client),
        store,
    });

    let bot = Bot::new(config.telegram_token);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![InMemStorage::<State>::new(), survey])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<State>, State>()
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::Onboarding { flow, session }].endpoint(onboarding))
        .branch(dptree::case![State::Questionnaire { session }].endpoint(questionnaire))
        .branch(dptree::case![State::Demographics { session, form }].endpoint(demographics))
        .branch(dptree::case![State::Completed].endpoint(completed))
}

// Handlers store the next state before replying, so a failed Telegram send
// never replays a document write.

async fn start(
    bot: Bot,
    dialogue: SurveyDialogue,
    msg: Message,
    survey: Arc<Survey>,
) -> HandlerResult {
    let study = &survey.study;
    info!("New participant in chat {}", msg.chat.id);
    bot.send_message(msg.chat.id, labels(study.locale).loading)
        .await?;

    let records = match survey.loader.load(&study.dataset).await {
        Ok(records) => records,
        Err(err) => {
            error!("chat {}: {}", msg.chat.id, err);
            // back to Start: the next message loads the dataset again
            dialogue.exit().await?;
            bot.send_message(msg.chat.id, labels(study.locale).unavailable)
                .reply_markup(messages::remove_keyboard())
                .await?;
            return Ok(());
        }
    };

    let session = ParticipantSession::new(study.build_sequence(&records, &mut rand::thread_rng()));
    if session.is_empty() {
        warn!("{} produced no items", study.dataset);
    }

    let flow = Onboarding::new();
    dialogue
        .update(State::Onboarding {
            flow: flow.clone(),
            session,
        })
        .await?;
    show_page(&bot, msg.chat.id, &flow, study).await
}

async fn show_page(bot: &Bot, chat_id: ChatId, flow: &Onboarding, study: &StudyConfig) -> HandlerResult {
    bot.send_message(chat_id, messages::onboarding_text(flow, study))
        .reply_markup(messages::onboarding_keyboard(flow.page(), study))
        .await?;
    Ok(())
}

enum OnboardingReply {
    Page,
    Gate(Gate),
    UseButtons,
}

async fn onboarding(
    bot: Bot,
    dialogue: SurveyDialogue,
    (mut flow, session): (Onboarding, ParticipantSession),
    msg: Message,
    survey: Arc<Survey>,
) -> HandlerResult {
    let study = &survey.study;
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, labels(study.locale).use_buttons)
            .await?;
        return Ok(());
    };

    let reply = match messages::parse_onboarding_input(text, study) {
        OnboardingInput::Next => match flow.next(&survey.answer_key) {
            Step::Moved(_) => OnboardingReply::Page,
            Step::Blocked(gate) => {
                debug!("chat {}: next blocked by {:?}", msg.chat.id, gate);
                OnboardingReply::Gate(gate)
            }
            Step::Completed { participant_id } => {
                return start_questionnaire(&bot, &dialogue, msg.chat.id, &survey, session, participant_id)
                    .await;
            }
        },
        OnboardingInput::Back => {
            flow.prev();
            OnboardingReply::Page
        }
        OnboardingInput::Consent if flow.page() == Page::Consent => {
            flow.set_consent(true);
            OnboardingReply::Page
        }
        OnboardingInput::QuizAnswer { question, value } if flow.page() == Page::ComprehensionQuiz => {
            flow.answer_quiz(question, value);
            OnboardingReply::Page
        }
        OnboardingInput::Text(participant_id) if flow.page() == Page::ParticipantId => {
            flow.set_participant_id(&participant_id);
            OnboardingReply::Page
        }
        _ => OnboardingReply::UseButtons,
    };

    dialogue
        .update(State::Onboarding {
            flow: flow.clone(),
            session,
        })
        .await?;

    match reply {
        OnboardingReply::Page => show_page(&bot, msg.chat.id, &flow, study).await?,
        OnboardingReply::Gate(gate) => {
            bot.send_message(msg.chat.id, messages::gate_message(gate, study))
                .await?;
        }
        OnboardingReply::UseButtons => {
            bot.send_message(msg.chat.id, labels(study.locale).use_buttons)
                .reply_markup(messages::onboarding_keyboard(flow.page(), study))
                .await?;
        }
    }
    Ok(())
}

async fn start_questionnaire(
    bot: &Bot,
    dialogue: &SurveyDialogue,
    chat_id: ChatId,
    survey: &Survey,
    mut session: ParticipantSession,
    participant_id: String,
) -> HandlerResult {
    info!("{} passed the comprehension quiz", participant_id);
    let collection = survey.study.collection_name(&participant_id);

    match session.begin(participant_id, collection)? {
        Phase::Active => {
            dialogue
                .update(State::Questionnaire {
                    session: session.clone(),
                })
                .await?;
            send_question(bot, chat_id, &session, survey).await
        }
        _ => begin_demographics(bot, dialogue, chat_id, survey, session).await,
    }
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    session: &ParticipantSession,
    survey: &Survey,
) -> HandlerResult {
    let Some(item) = session.current() else {
        return Ok(());
    };
    let options = survey.study.options_for(item, &mut rand::thread_rng());

    bot.send_message(
        chat_id,
        messages::question_text(item, session.position() + 1, session.len(), &survey.study),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(messages::options_keyboard(&options))
    .await?;
    Ok(())
}

async fn questionnaire(
    bot: Bot,
    dialogue: SurveyDialogue,
    mut session: ParticipantSession,
    msg: Message,
    survey: Arc<Survey>,
) -> HandlerResult {
    let study = &survey.study;
    let value = match (session.current(), msg.text()) {
        (Some(item), Some(text)) => study
            .option_for_label(item, text)
            .map(|option| option.value.clone()),
        _ => None,
    };
    let Some(value) = value else {
        bot.send_message(msg.chat.id, labels(study.locale).use_buttons)
            .await?;
        return send_question(&bot, msg.chat.id, &session, &survey).await;
    };

    let outcome = session.submit_choice(&value, survey.store.as_ref()).await?;
    if !outcome.persisted {
        warn!(
            "{}: response {} kept in session only",
            session.participant_id(),
            session.position()
        );
    }
    match outcome.phase {
        Phase::Active => {
            dialogue
                .update(State::Questionnaire {
                    session: session.clone(),
                })
                .await?;
            send_question(&bot, msg.chat.id, &session, &survey).await
        }
        _ => {
            info!(
                "{}: {}",
                session.participant_id(),
                session.attention_summary()
            );
            begin_demographics(&bot, &dialogue, msg.chat.id, &survey, session).await
        }
    }
}

async fn begin_demographics(
    bot: &Bot,
    dialogue: &SurveyDialogue,
    chat_id: ChatId,
    survey: &Survey,
    session: ParticipantSession,
) -> HandlerResult {
    let study = &survey.study;
    let form = DemographicsForm::new(study.collect_race_ethnicity);
    dialogue
        .update(State::Demographics {
            session,
            form: form.clone(),
        })
        .await?;

    bot.send_message(chat_id, labels(study.locale).demographics_intro)
        .reply_markup(messages::remove_keyboard())
        .await?;
    ask_next_field(bot, chat_id, &form, study).await
}

async fn ask_next_field(
    bot: &Bot,
    chat_id: ChatId,
    form: &DemographicsForm,
    study: &StudyConfig,
) -> HandlerResult {
    if let Some(field) = form.next_field() {
        bot.send_message(chat_id, messages::demographics_prompt(field, study))
            .reply_markup(messages::demographics_keyboard(field))
            .await?;
    }
    Ok(())
}

async fn demographics(
    bot: Bot,
    dialogue: SurveyDialogue,
    (session, mut form): (ParticipantSession, DemographicsForm),
    msg: Message,
    survey: Arc<Survey>,
) -> HandlerResult {
    let study = &survey.study;
    let (Some(field), Some(text)) = (form.next_field(), msg.text()) else {
        return ask_next_field(&bot, msg.chat.id, &form, study).await;
    };

    if let Err(err) = form.fill(field, text) {
        bot.send_message(msg.chat.id, err.to_string()).await?;
        return ask_next_field(&bot, msg.chat.id, &form, study).await;
    }

    if !form.is_complete() {
        dialogue
            .update(State::Demographics {
                session,
                form: form.clone(),
            })
            .await?;
        return ask_next_field(&bot, msg.chat.id, &form, study).await;
    }

    let record = form.finish(session.participant_id())?;
    let bundle = survey_bundle(session.responses(), &record);
    if !submit_survey(survey.store.as_ref(), &study.bundle_collection, bundle).await {
        warn!(
            "{}: survey bundle was not stored, see the log for its contents",
            session.participant_id()
        );
    }
    dialogue.update(State::Completed).await?;
    info!(
        "{} completed the survey ({} responses, {})",
        session.participant_id(),
        session.responses().len(),
        session.attention_summary()
    );

    bot.send_message(msg.chat.id, labels(study.locale).completed)
        .reply_markup(messages::remove_keyboard())
        .await?;
    Ok(())
}

async fn completed(bot: Bot, msg: Message, survey: Arc<Survey>) -> HandlerResult {
    bot.send_message(msg.chat.id, labels(survey.study.locale).already_completed)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::FailingStore;
    use survey::QuestionItem;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHAT: ChatId = ChatId(42);

    fn message(text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": CHAT.0, "type": "private", "first_name": "Ann" },
            "from": { "id": CHAT.0, "is_bot": false, "first_name": "Ann" },
            "text": text,
        }))
        .unwrap()
    }

    /// A Telegram API whose `sendMessage` either succeeds or fails with a 400.
    async fn telegram(delivers: bool) -> MockServer {
        let server = MockServer::start().await;
        let response = if delivers {
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {
                    "message_id": 2,
                    "date": 1_700_000_001,
                    "chat": { "id": CHAT.0, "type": "private", "first_name": "Ann" },
                    "text": "ok",
                }
            }))
        } else {
            ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found",
            }))
        };
        Mock::given(method("POST"))
            .and(path_regex(r"(?i)^/bot[^/]+/sendmessage$"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn bot(server: &MockServer) -> Bot {
        Bot::new("123:abc").set_api_url(reqwest::Url::parse(&server.uri()).unwrap())
    }

    fn survey(store: Arc<dyn DocumentStore>, dataset: Option<String>) -> Arc<Survey> {
        let mut study = study::presets::semeval_sentiment();
        if let Some(dataset) = dataset {
            study.dataset = dataset;
        }
        Arc::new(Survey {
            answer_key: study.answer_key(),
            study,
            loader: DatasetLoader::new(reqwest::Client::new()),
            store,
        })
    }

    fn dialogue() -> SurveyDialogue {
        SurveyDialogue::new(InMemStorage::<State>::new(), CHAT)
    }

    fn active_session(items: usize) -> ParticipantSession {
        let sequence = (0..items)
            .map(|i| QuestionItem::new(format!("q{}", i), format!("s{}", i), String::new()))
            .collect();
        let mut session = ParticipantSession::new(sequence);
        session
            .begin("P1".to_string(), "answers".to_string())
            .unwrap();
        session
    }

    async fn sent_texts(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| String::from_utf8_lossy(&request.body).into_owned())
            .collect()
    }

    async fn questionnaire_session(dialogue: &SurveyDialogue) -> ParticipantSession {
        match dialogue.get().await.unwrap() {
            Some(State::Questionnaire { session }) => session,
            _ => panic!("dialogue left the questionnaire"),
        }
    }

    #[tokio::test]
    async fn failed_send_does_not_record_an_answer_twice() {
        let server = telegram(false).await;
        let store = Arc::new(MemoryStore::new());
        let survey = survey(store.clone(), None);
        let dialogue = dialogue();

        let result = questionnaire(
            bot(&server),
            dialogue.clone(),
            active_session(3),
            message("Positive"),
            survey.clone(),
        )
        .await;
        assert!(result.is_err());

        let session = questionnaire_session(&dialogue).await;
        assert_eq!(session.position(), 1);
        let result = questionnaire(
            bot(&server),
            dialogue.clone(),
            session,
            message("Positive"),
            survey,
        )
        .await;
        assert!(result.is_err());

        let questions: Vec<_> = store
            .collection("answers")
            .into_iter()
            .map(|doc| doc["question"].clone())
            .collect();
        assert_eq!(
            questions,
            vec![store::Value::from("q0"), store::Value::from("q1")]
        );
        assert_eq!(questionnaire_session(&dialogue).await.position(), 2);
    }

    #[tokio::test]
    async fn unknown_label_asks_for_buttons_without_advancing() {
        let server = telegram(true).await;
        let store = Arc::new(MemoryStore::new());
        let dialogue = dialogue();
        dialogue
            .update(State::Questionnaire {
                session: active_session(2),
            })
            .await
            .unwrap();

        questionnaire(
            bot(&server),
            dialogue.clone(),
            active_session(2),
            message("Delighted"),
            survey(store.clone(), None),
        )
        .await
        .unwrap();

        assert!(store.documents().is_empty());
        assert_eq!(questionnaire_session(&dialogue).await.position(), 0);
        let texts = sent_texts(&server).await;
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Please choose one of the options below."));
        assert!(texts[1].contains("Question (1/2)"));
        assert!(texts[1].contains("s0"));
    }

    #[tokio::test]
    async fn failed_load_lets_the_next_message_retry() {
        let server = telegram(true).await;
        Mock::given(method("GET"))
            .and(path("/data/set_4.csv"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;
        let survey = survey(
            Arc::new(MemoryStore::new()),
            Some(format!("{}/data/set_4.csv", server.uri())),
        );
        let dialogue = dialogue();

        start(bot(&server), dialogue.clone(), message("/start"), survey.clone())
            .await
            .unwrap();
        assert!(dialogue.get().await.unwrap().is_none());
        let texts = sent_texts(&server).await;
        assert!(texts
            .iter()
            .any(|text| text.contains("The survey could not be loaded.")));

        start(bot(&server), dialogue.clone(), message("hello"), survey)
            .await
            .unwrap();
        assert!(dialogue.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_sequence_goes_straight_to_demographics() {
        let server = telegram(true).await;
        let survey = survey(Arc::new(MemoryStore::new()), None);
        let dialogue = dialogue();

        start_questionnaire(
            &bot(&server),
            &dialogue,
            CHAT,
            &survey,
            ParticipantSession::new(Vec::new()),
            "P1".to_string(),
        )
        .await
        .unwrap();

        match dialogue.get().await.unwrap() {
            Some(State::Demographics { session, form }) => {
                assert_eq!(session.phase(), Phase::Demographics);
                assert_eq!(session.participant_id(), "P1");
                assert_eq!(form, DemographicsForm::new(survey.study.collect_race_ethnicity));
            }
            _ => panic!("expected the demographics form"),
        }
        let texts = sent_texts(&server).await;
        assert!(texts
            .iter()
            .any(|text| text.contains("What is your age?")));
    }

    fn demographics_ready() -> (ParticipantSession, DemographicsForm) {
        let mut form = DemographicsForm::new(false);
        form.set_age("30").unwrap();
        (active_session(0), form)
    }

    #[tokio::test]
    async fn failed_bundle_write_still_completes() {
        let server = telegram(true).await;
        let dialogue = dialogue();

        demographics(
            bot(&server),
            dialogue.clone(),
            demographics_ready(),
            message("Female"),
            survey(Arc::new(FailingStore), None),
        )
        .await
        .unwrap();

        assert!(matches!(
            dialogue.get().await.unwrap(),
            Some(State::Completed)
        ));
        let texts = sent_texts(&server).await;
        assert!(texts
            .iter()
            .any(|text| text.contains("Thank you for your participation!")));
    }

    #[tokio::test]
    async fn failed_completion_message_stores_one_bundle() {
        let server = telegram(false).await;
        let store = Arc::new(MemoryStore::new());
        let dialogue = dialogue();

        let result = demographics(
            bot(&server),
            dialogue.clone(),
            demographics_ready(),
            message("Female"),
            survey(store.clone(), None),
        )
        .await;
        assert!(result.is_err());

        assert_eq!(store.collection("surveys").len(), 1);
        assert!(matches!(
            dialogue.get().await.unwrap(),
            Some(State::Completed)
        ));
    }
}
