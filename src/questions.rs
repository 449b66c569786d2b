//! 診断の設問と選択肢
//!
//! 選択肢は上から順に回答値 1, 2, 3 に対応します。

use serde::Serialize;

use crate::types::{OPTION_COUNT, QUESTION_COUNT};

/// 設問1件
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub question: &'static str,
    pub options: [&'static str; OPTION_COUNT as usize],
}

pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        question: "🧠 On a scale of 1 to 3, how calm are you under pressure?",
        options: ["Very calm", "Moderately calm", "Easily stressed"],
    },
    Question {
        question: "🎉 On a scale of 1 to 3, how much do you enjoy wild, energetic fun over quiet time?",
        options: ["Love it (wild fun)", "Balanced", "Prefer quiet time"],
    },
    Question {
        question: "🤔 On a scale of 1 to 3, how impulsive are your decisions?",
        options: ["Very impulsive", "Moderately impulsive", "Thoughtful and planned"],
    },
    Question {
        question: "😨 On a scale of 1 to 3, how strongly do you fear losing control or power?",
        options: ["Very strongly", "Moderately", "Not much"],
    },
    Question {
        question: "🪞 On a scale of 1 to 3, how emotional and expressive are you?",
        options: ["Very expressive", "Moderately expressive", "Reserved"],
    },
    Question {
        question: "🧑‍🤝‍🧑 On a scale of 1 to 3, how much of a leader are you in group settings?",
        options: ["Strong leader", "Sometimes lead", "Prefer to follow"],
    },
    Question {
        question: "🔪 On a scale of 1 to 3, how intensely do you react to betrayal?",
        options: ["Very intensely", "Moderately", "Calmly"],
    },
    Question {
        question: "⚖️ On a scale of 1 to 3, how much do you value logic over emotions in life?",
        options: ["Highly value logic", "Balanced", "Highly value emotions"],
    },
    Question {
        question: "🐶 On a scale of 1 to 3, how affectionate and attached are you to animals or pets?",
        options: ["Very affectionate", "Moderately", "Not very affectionate"],
    },
    Question {
        question: "👗 On a scale of 1 to 3, how stylish and expressive is your dressing style?",
        options: ["Very stylish", "Moderately stylish", "Practical and simple"],
    },
    Question {
        question: "🛠️ On a scale of 1 to 3, how much do you prefer hands-on, practical work over theoretical?",
        options: ["Strongly prefer hands-on", "Balanced", "Strongly prefer theoretical"],
    },
    Question {
        question: "🗣️ On a scale of 1 to 3, how much do people find you socially funny or talkative?",
        options: ["Very funny/talkative", "Moderately", "Quiet/reserved"],
    },
    Question {
        question: "💔 On a scale of 1 to 3, how deeply do you hold grudges when someone hurts you?",
        options: ["Very deeply", "Moderately", "Easily forgive"],
    },
    Question {
        question: "🫶 On a scale of 1 to 3, how much do you admire honesty and kindness in others?",
        options: ["Highly admire", "Moderately", "Less of a priority"],
    },
    Question {
        question: "✈️ On a scale of 1 to 3, how much do you crave a peaceful, scenic vacation over a luxurious one?",
        options: ["Peaceful, scenic", "Balanced", "Luxurious"],
    },
];

/// 選択肢のテキストから回答値（1始まり）を求める
pub fn option_value(question_index: usize, option_text: &str) -> Option<u8> {
    let question = QUESTIONS.get(question_index)?;
    question
        .options
        .iter()
        .position(|o| *o == option_text)
        .map(|i| i as u8 + 1)
}
