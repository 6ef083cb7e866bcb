//! Presentation Renderer
//!
//! Emits `index.html` and `styles.css` for a course.
//!
//! ## Key Invariants
//!
//! 1. **Escape Everything Authored**: titles, slide content, narration and
//!    alternatives all pass through [`escape_html`] before they reach markup.
//! 2. **Escape, Then Break**: slide content is escaped first and only then
//!    gets its newlines turned into `<br>`, so inserted tags stay tags.
//! 3. **Referenced Means Packaged**: every asset path comes from the
//!    [`AssetManifest`]; the renderer never touches binary data.
//! 4. **Inert Embedded Data**: JSON embedded in an inline `<script>` cannot
//!    close the element early.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use serde::Serialize;

use crate::assets::{AssetManifest, AssetSlot, SCRIPT_JS, STYLES_CSS};
use crate::course::{CourseDocument, Question, Slide, VideoContent};
use crate::timeline::{format_time, TimelineData, TimelineScene};

const STYLES: &str = include_str!("templates/styles.css");

const MISSING_SCENE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1280 720" style="background-color: #2e3748;"><text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" fill="white" font-size="40">No image for this scene</text></svg>"##;

lazy_static! {
    /// Shown for scenes that carry no image.
    pub static ref MISSING_SCENE_IMAGE: String = format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(MISSING_SCENE_SVG)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// ESCAPING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// [`escape_html`] plus double quotes, for attribute values.
pub fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Escaped slide content with newlines as `<br>`.
pub fn content_with_breaks(content: &str) -> String {
    escape_html(&content.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// Serialize `value` for an inline `<script>` element.
///
/// `<` only occurs inside JSON strings, where `\u003c` is an equivalent escape
/// in both JSON and JavaScript.
pub fn embed_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn render_slide(index: usize, slide: &Slide, assets: &AssetManifest) -> String {
    let image = assets
        .path_for(AssetSlot::SlideImage(index))
        .map(|path| {
            format!(
                "\n          <img src=\"{}\" alt=\"{}\" class=\"slide-image\">",
                path,
                escape_attr(&slide.title)
            )
        })
        .unwrap_or_default();

    format!(
        r#"        <div class="slide" data-slide="{index}">
          <h2>{title}</h2>{image}
          <div class="content">{content}</div>
        </div>"#,
        index = index,
        title = escape_html(&slide.title),
        image = image,
        content = content_with_breaks(&slide.content),
    )
}

/// The Scene Timeline embedded for the playback engine.
pub fn scene_timeline(video: &VideoContent, assets: &AssetManifest) -> TimelineData {
    TimelineData {
        title: video.title.clone(),
        total_duration: video.total_duration,
        scenes: video
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| TimelineScene {
                narration: scene.narration.clone(),
                duration: scene.duration,
                image: assets
                    .path_for(AssetSlot::SceneImage(i))
                    .map(str::to_string)
                    .unwrap_or_else(|| MISSING_SCENE_IMAGE.clone()),
            })
            .collect(),
    }
}

fn render_video(video: &VideoContent, assets: &AssetManifest) -> String {
    let timeline = scene_timeline(video, assets);
    let (first_image, first_narration) = timeline
        .scenes
        .first()
        .map(|s| (s.image.clone(), s.narration.clone()))
        .unwrap_or_default();

    let mut audio = String::new();
    if let Some(path) = assets.path_for(AssetSlot::Narration) {
        audio.push_str(&format!(
            "\n        <audio id=\"narration-audio\" src=\"{}\" preload=\"auto\"></audio>",
            path
        ));
    }
    if let Some(path) = assets.path_for(AssetSlot::BackgroundMusic) {
        audio.push_str(&format!(
            "\n        <audio id=\"bg-music\" src=\"{}\" loop preload=\"auto\"></audio>",
            path
        ));
    }

    format!(
        r#"      <div id="video-section" class="section" style="display: none;">
        <h2>{title}</h2>
        <div class="video-player">
          <div class="video-screen">
            <img id="video-image" src="{first_image}" alt="Video scene" class="video-frame">
            <div id="video-narration" class="video-narration">{first_narration}</div>
            <div id="scene-indicator" class="scene-indicator">Scene 1 / {scene_count}</div>
          </div>
          <div class="video-progress">
            <div class="video-progress-bar">
              <div id="video-progress-fill" class="video-progress-fill"></div>
            </div>
            <div class="video-time">
              <span id="current-time">0:00</span> / <span id="total-time">{total_time}</span>
            </div>
          </div>
          <div class="video-controls">
            <button type="button" id="btn-restart-video" class="video-btn">&#9198; Restart</button>
            <button type="button" id="btn-play-video" class="video-btn primary">&#9654; Play</button>
          </div>
        </div>
        <script>window.sceneTimeline = {timeline};</script>{audio}
      </div>"#,
        title = escape_html(&video.title),
        first_image = escape_attr(&first_image),
        first_narration = escape_html(&first_narration),
        scene_count = timeline.scenes.len(),
        total_time = format_time(video.total_duration),
        timeline = embed_json(&timeline),
        audio = audio,
    )
}

fn render_question(index: usize, question: &Question) -> String {
    let alternatives = question
        .alternatives
        .iter()
        .enumerate()
        .map(|(alt_index, alt)| {
            format!(
                r#"            <label class="alternative">
              <input type="radio" name="q{q}" value="{value}">
              <span>{text}</span>
            </label>"#,
                q = index,
                value = alt_index,
                text = escape_html(alt),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <div class="question" data-question="{index}" data-correct="{correct}">
          <p class="question-text">{number}. {text}</p>
          <div class="alternatives">
{alternatives}
          </div>
          <div class="feedback" aria-live="polite"></div>
        </div>"#,
        index = index,
        correct = question.correct_index,
        number = index + 1,
        text = escape_html(&question.text),
        alternatives = alternatives,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn render_markup(course: &CourseDocument, assets: &AssetManifest) -> String {
    let title = escape_html(&course.title);

    let slides = course
        .slides
        .iter()
        .enumerate()
        .map(|(i, s)| render_slide(i, s, assets))
        .collect::<Vec<_>>()
        .join("\n");

    let questions = course
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| render_question(i, q))
        .collect::<Vec<_>>()
        .join("\n");

    let (video_tab, video) = match &course.video {
        Some(v) => (
            "\n        <button type=\"button\" class=\"tab\" data-section=\"video\">Video</button>",
            format!("\n\n      <!-- Video Section -->\n{}", render_video(v, assets)),
        ),
        None => ("", String::new()),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <link rel="stylesheet" href="{styles}">
</head>
<body>
  <div class="container">
    <header>
      <h1>{title}</h1>
      <div class="progress-bar"><div class="progress-fill"></div></div>
      <div class="section-tabs">
        <button type="button" class="tab active" data-section="slides">Content</button>{video_tab}
        <button type="button" class="tab" data-section="quiz">Quiz</button>
      </div>
    </header>

    <main>
      <!-- Slides Section -->
      <div id="slides-container" class="section">
{slides}
      </div>{video}

      <!-- Quiz Section -->
      <div id="quiz-container" class="section" style="display: none;">
        <h2>Final Quiz</h2>
{questions}
      </div>

      <!-- Completion -->
      <div id="completion-container" class="section" style="display: none;">
        <div class="completion-message">
          <h2>Congratulations!</h2>
          <p>You have completed the course.</p>
          <p class="score"></p>
        </div>
      </div>
    </main>

    <footer>
      <button type="button" id="btn-prev" disabled>&larr; Previous</button>
      <span id="page-info"></span>
      <button type="button" id="btn-next">Next &rarr;</button>
    </footer>
  </div>

  <script src="{script}"></script>
</body>
</html>
"#,
        title = title,
        styles = STYLES_CSS,
        video_tab = video_tab,
        slides = slides,
        video = video,
        questions = questions,
        script = SCRIPT_JS,
    )
}

pub fn render_styles() -> String {
    STYLES.to_string()
}
