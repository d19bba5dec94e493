use ghostpen_settings::GhostpenSettings;

/// What a line of human feedback asks the engine to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserIntent {
    Accept,
    Exit,
    /// Anything else, kept verbatim as the next user turn.
    Revise(String),
}

impl UserIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Exit => "exit",
            Self::Revise(_) => "revise",
        }
    }
}

/// Case-insensitive, whole-string keyword matching.
#[derive(Clone, Debug)]
pub struct IntentClassifier {
    accept: Vec<String>,
    exit: Vec<String>,
}

fn normalized(keywords: &[String]) -> Vec<String> {
    keywords.iter().map(|k| k.trim().to_lowercase()).collect()
}

impl IntentClassifier {
    pub fn new(accept: &[String], exit: &[String]) -> Self {
        Self {
            accept: normalized(accept),
            exit: normalized(exit),
        }
    }

    pub fn from_settings(settings: &GhostpenSettings) -> Self {
        Self::new(&settings.accept_keywords, &settings.exit_keywords)
    }

    /// Exit wins if a keyword is configured as both.
    pub fn classify(&self, feedback: &str) -> UserIntent {
        let key = feedback.trim().to_lowercase();
        if self.exit.contains(&key) {
            UserIntent::Exit
        } else if self.accept.contains(&key) {
            UserIntent::Accept
        } else {
            UserIntent::Revise(feedback.to_string())
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::from_settings(&GhostpenSettings::default())
    }
}
