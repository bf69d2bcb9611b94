use chrono::{DateTime, Utc};
use log::{error, info};

use super::ResponseRecord;
use crate::error::FieldError;
use crate::store::{Document, DocumentStore, ToDocument, Value};

pub const MIN_AGE: u8 = 18;
pub const MAX_AGE: u8 = 120;

/// A closed set of answers for a form field.
pub trait FormOption: Sized + Copy + 'static {
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn value(self) -> &'static str;
    fn label(self) -> &'static str;

    /// Accepts either the label or the recorded value, ignoring ASCII case.
    fn parse(input: &str) -> Result<Self, FieldError> {
        let input = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.label().eq_ignore_ascii_case(input) || o.value().eq_ignore_ascii_case(input))
            .ok_or_else(|| FieldError::UnknownOption {
                field: Self::FIELD,
                input: input.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
    NonBinary,
    Other,
    PreferNotToSay,
}

impl FormOption for Gender {
    const FIELD: &'static str = "gender";
    const ALL: &'static [Self] = &[
        Gender::Female,
        Gender::Male,
        Gender::NonBinary,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    fn value(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer not to say",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::NonBinary => "Non-Binary",
            Gender::Other => "Other",
            Gender::PreferNotToSay => "Prefer not to say",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Race {
    White,
    Black,
    AmericanIndian,
    Asian,
    NativeHawaiian,
    Multiracial,
    Other,
}

impl FormOption for Race {
    const FIELD: &'static str = "race";
    const ALL: &'static [Self] = &[
        Race::White,
        Race::Black,
        Race::AmericanIndian,
        Race::Asian,
        Race::NativeHawaiian,
        Race::Multiracial,
        Race::Other,
    ];

    fn value(self) -> &'static str {
        match self {
            Race::White => "white",
            Race::Black => "black",
            Race::AmericanIndian => "american_indian",
            Race::Asian => "asian",
            Race::NativeHawaiian => "native_hawaiian",
            Race::Multiracial => "multiracial",
            Race::Other => "other",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Race::White => "White",
            Race::Black => "Black/African American",
            Race::AmericanIndian => "American Indian/Alaska Native",
            Race::Asian => "Asian",
            Race::NativeHawaiian => "Native Hawaiian/Pacific Islander",
            Race::Multiracial => "Multiracial/Mixed",
            Race::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ethnicity {
    Hispanic,
    NonHispanic,
}

impl FormOption for Ethnicity {
    const FIELD: &'static str = "ethnicity";
    const ALL: &'static [Self] = &[Ethnicity::Hispanic, Ethnicity::NonHispanic];

    fn value(self) -> &'static str {
        match self {
            Ethnicity::Hispanic => "hispanic",
            Ethnicity::NonHispanic => "non_hispanic",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Ethnicity::Hispanic => "Hispanic",
            Ethnicity::NonHispanic => "Non-Hispanic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Age,
    Gender,
    Race,
    Ethnicity,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Gender => Gender::FIELD,
            Field::Race => Race::FIELD,
            Field::Ethnicity => Ethnicity::FIELD,
        }
    }

    /// Button labels for the field; age is typed.
    pub fn option_labels(self) -> Vec<&'static str> {
        fn labels<T: FormOption>() -> Vec<&'static str> {
            T::ALL.iter().map(|o| o.label()).collect()
        }
        match self {
            Field::Age => Vec::new(),
            Field::Gender => labels::<Gender>(),
            Field::Race => labels::<Race>(),
            Field::Ethnicity => labels::<Ethnicity>(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemographicsForm {
    age: Option<u8>,
    gender: Option<Gender>,
    race: Option<Race>,
    ethnicity: Option<Ethnicity>,
    collect_race_ethnicity: bool,
}

impl DemographicsForm {
    pub fn new(collect_race_ethnicity: bool) -> Self {
        Self {
            age: None,
            gender: None,
            race: None,
            ethnicity: None,
            collect_race_ethnicity,
        }
    }

    pub fn set_age(&mut self, input: &str) -> Result<(), FieldError> {
        let age: u32 = input.trim().parse().map_err(|_| FieldError::AgeNotANumber)?;
        if !(u32::from(MIN_AGE)..=u32::from(MAX_AGE)).contains(&age) {
            return Err(FieldError::AgeOutOfRange {
                min: MIN_AGE,
                max: MAX_AGE,
            });
        }
        self.age = Some(age as u8);
        Ok(())
    }

    pub fn fill(&mut self, field: Field, input: &str) -> Result<(), FieldError> {
        match field {
            Field::Age => self.set_age(input)?,
            Field::Gender => self.gender = Some(Gender::parse(input)?),
            Field::Race => self.race = Some(Race::parse(input)?),
            Field::Ethnicity => self.ethnicity = Some(Ethnicity::parse(input)?),
        }
        Ok(())
    }

    /// The first required field still empty.
    pub fn next_field(&self) -> Option<Field> {
        if self.age.is_none() {
            Some(Field::Age)
        } else if self.gender.is_none() {
            Some(Field::Gender)
        } else if self.collect_race_ethnicity && self.race.is_none() {
            Some(Field::Race)
        } else if self.collect_race_ethnicity && self.ethnicity.is_none() {
            Some(Field::Ethnicity)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next_field().is_none()
    }

    pub fn finish(&self, participant_id: &str) -> Result<DemographicsRecord, FieldError> {
        if let Some(field) = self.next_field() {
            return Err(FieldError::Missing(field.name()));
        }
        let (Some(age), Some(gender)) = (self.age, self.gender) else {
            return Err(FieldError::Missing(Field::Age.name()));
        };

        Ok(DemographicsRecord {
            age,
            gender,
            race: self.race,
            ethnicity: self.ethnicity,
            participant_id: participant_id.to_string(),
            timestamp: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemographicsRecord {
    pub age: u8,
    pub gender: Gender,
    pub race: Option<Race>,
    pub ethnicity: Option<Ethnicity>,
    pub participant_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ToDocument for DemographicsRecord {
    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("age".to_string(), i64::from(self.age).into());
        doc.insert("gender".to_string(), self.gender.value().into());
        doc.insert("race".to_string(), self.race.map(Race::value).into());
        doc.insert(
            "ethnicity".to_string(),
            self.ethnicity.map(Ethnicity::value).into(),
        );
        // key name kept from the existing result exports
        doc.insert("prolificID".to_string(), self.participant_id.as_str().into());
        doc.insert("timestamp".to_string(), self.timestamp.into());
        doc
    }
}

/// `{responses, ratings, demographics}` as stored in the bundle collection.
pub fn survey_bundle(responses: &[ResponseRecord], demographics: &DemographicsRecord) -> Document {
    let mut doc = Document::new();
    doc.insert(
        "responses".to_string(),
        Value::Array(
            responses
                .iter()
                .map(|r| Value::Map(r.to_document()))
                .collect(),
        ),
    );
    doc.insert("ratings".to_string(), Value::Array(Vec::new()));
    doc.insert(
        "demographics".to_string(),
        Value::Map(demographics.to_document()),
    );
    doc
}

/// Stores the final bundle. On failure the bundle is written to the log
/// instead; either way the participant proceeds to completion.
pub async fn submit_survey(store: &dyn DocumentStore, collection: &str, bundle: Document) -> bool {
    match store.append(collection, bundle.clone()).await {
        Ok(()) => {
            info!("survey successfully written to {}", collection);
            true
        }
        Err(err) => {
            error!("error writing survey to {}: {}", collection, err);
            match serde_json::to_string(&bundle) {
                Ok(json) => info!("survey data: {}", json),
                Err(err) => error!("survey data could not be serialized: {}", err),
            }
            false
        }
    }
}
