//! ターミナル版の診断
//!
//! Usage:
//!   cargo run --bin quiz_cli
//!   cargo run --bin quiz_cli -- --answers 1,1,1,1,1,1,1,1,1,1,1,1,1,1,1
//!
//! 対話モードで空行を入力した設問は未回答として扱います。

use anyhow::{Context, Result};
use character_quiz_lib::model::AppConfig;
use character_quiz_lib::questions::QUESTIONS;
use character_quiz_lib::{AnswerSheet, ImageResolver, Predictor};
use std::io::{BufRead, Write};
use std::path::PathBuf;

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let mut config_path = AppConfig::default_path();
    let mut answers_arg: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = PathBuf::from(args.next().context("--config にはパスが必要です")?);
            }
            "--answers" => {
                answers_arg = Some(args.next().context("--answers には回答列が必要です")?);
            }
            other => anyhow::bail!("不明な引数: {}", other),
        }
    }

    let config = AppConfig::load_from_or_default(&config_path);

    // 成果物が無ければここで終了する
    let predictor = Predictor::load(&config.model).context(
        "必要なモデルファイルが見つからないか壊れています。先に train_model を実行してください",
    )?;
    let mut images = ImageResolver::from_settings(&config.image)?;

    let sheet = match answers_arg {
        Some(list) => parse_answer_list(&list)?,
        None => ask_questions()?,
    };

    let vector = sheet.resolve(config.quiz.require_all_answered)?;
    let prediction = predictor.predict_vector(&vector)?;

    println!("\n🎉 You are most like {}!", prediction.character);
    println!(
        "  背景色: {}  文字色: {}",
        prediction.hint.background, prediction.hint.text
    );

    let image = images.resolve(&prediction.character);
    if image.is_placeholder() {
        println!("  画像: (取得できませんでした) {}", image.describe());
    } else {
        println!("  画像: {}", image.describe());
    }

    Ok(())
}

/// `1,2,3,...` 形式の回答列（空要素は未回答）
fn parse_answer_list(list: &str) -> Result<AnswerSheet> {
    let answers = list
        .split(',')
        .map(|s| {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<u8>()
                    .map(Some)
                    .with_context(|| format!("回答が数値ではありません: {}", s))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(AnswerSheet::new(answers))
}

fn ask_questions() -> Result<AnswerSheet> {
    println!("🧠 Which Famous Character Are You?");
    println!("Answer the questions below and find out which iconic character you're most like!");
    println!("Be honest :)\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = Vec::with_capacity(QUESTIONS.len());

    for (i, question) in QUESTIONS.iter().enumerate() {
        println!("Q{}. {}", i + 1, question.question);
        for (j, option) in question.options.iter().enumerate() {
            println!("   {}) {}", j + 1, option);
        }

        let answer = loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next() else {
                // 入力終了以降は未回答
                break None;
            };
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                break None;
            }
            match line.parse::<u8>() {
                Ok(v) if (1..=question.options.len() as u8).contains(&v) => break Some(v),
                _ => println!("1-{} で入力してください", question.options.len()),
            }
        };
        answers.push(answer);
        println!();
    }

    Ok(AnswerSheet::new(answers))
}
