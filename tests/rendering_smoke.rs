//! End-to-end rendering checks on decoded PNG pixels

use tiny_skia::Pixmap;
use zhaomu::rendering::{BlockGlyphs, CardRenderer, CodeEncoder, CodeMatrix};
use zhaomu::summary::{NoteLine, TodoLine, TodoStats};
use zhaomu::{DailySummary, Error, Result};

// Code square: right and bottom edges sit on the 60px safe margin
const CODE_X: u32 = 1080 - 60 - 220;
const CODE_Y: u32 = 1440 - 60 - 220;
const CODE_SIZE: u32 = 220;

struct Unencodable;

impl CodeEncoder for Unencodable {
    fn encode(&self, _data: &str) -> Result<CodeMatrix> {
        Err(Error::CodeError("data too long".into()))
    }
}

fn scenario() -> DailySummary {
    DailySummary {
        date_label: "2024年05月01日 星期三".into(),
        todos: vec![
            TodoLine { title: "买牛奶".into(), done: true },
            TodoLine { title: "写周报".into(), done: false },
        ],
        notes: vec![NoteLine { text: "今天天气不错".into() }],
        todo_stats: TodoStats { completed: 1, total: 2 },
        note_count: 1,
        share_target_url: "https://example.app/share/abc".into(),
        enrichment: Default::default(),
    }
}

fn code_region_counts(pixmap: &Pixmap) -> (usize, usize) {
    let (mut dark, mut light) = (0, 0);
    for y in CODE_Y..CODE_Y + CODE_SIZE {
        for x in CODE_X..CODE_X + CODE_SIZE {
            let p = pixmap.pixel(x, y).unwrap();
            if p.red() > 200 && p.green() > 200 && p.blue() > 200 {
                light += 1;
            } else if p.red() < 40 && p.green() < 40 {
                dark += 1;
            }
        }
    }
    (dark, light)
}

/// Every code found on the card, decoded.
fn decode_codes(pixmap: &Pixmap) -> Vec<String> {
    let mut img = rqrr::PreparedImage::prepare_from_greyscale(
        pixmap.width() as usize,
        pixmap.height() as usize,
        |x, y| {
            let p = pixmap.pixel(x as u32, y as u32).unwrap();
            ((p.red() as u16 + p.green() as u16 + p.blue() as u16) / 3) as u8
        },
    );
    img.detect_grids()
        .into_iter()
        .filter_map(|grid| grid.decode().ok().map(|(_, content)| content))
        .collect()
}

#[test]
fn scenario_card_decodes_with_code_in_bottom_right() {
    let card = CardRenderer::with_engine(BlockGlyphs::new()).render(&scenario()).unwrap();
    assert!(card.notice.is_none());
    assert!(card.data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));

    let pixmap = Pixmap::decode_png(&card.image_bytes).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (1080, 1440));

    let (dark, light) = code_region_counts(&pixmap);
    assert!(light > 0, "code background missing");
    assert!(dark > 0, "code modules missing");

    // Quiet zone corner is light
    let corner = pixmap.pixel(CODE_X + 1, CODE_Y + 1).unwrap();
    assert!(corner.red() > 200);

    assert_eq!(decode_codes(&pixmap), vec!["https://example.app/share/abc".to_string()]);
}

#[test]
fn encoder_failure_still_renders_card_without_code() {
    let card = CardRenderer::with_engine(BlockGlyphs::new())
        .encoder(Box::new(Unencodable))
        .render(&scenario())
        .unwrap();
    assert_eq!(card.notice.as_deref(), Some("二维码生成失败，图片中已省略二维码"));

    let pixmap = Pixmap::decode_png(&card.image_bytes).unwrap();
    let (_, light) = code_region_counts(&pixmap);
    assert_eq!(light, 0, "code region should show only the background");
    assert!(decode_codes(&pixmap).is_empty());
}

#[test]
fn empty_day_renders() {
    let summary = DailySummary {
        todos: vec![],
        notes: vec![],
        todo_stats: TodoStats::default(),
        note_count: 0,
        ..scenario()
    };
    let card = CardRenderer::with_engine(BlockGlyphs::new()).render(&summary).unwrap();
    assert_eq!((card.pixel_width, card.pixel_height), (1080, 1440));
}

#[test]
fn many_items_render_same_size() {
    let mut summary = scenario();
    summary.todos = (0..20).map(|i| TodoLine { title: format!("任务 {}", i), done: i % 2 == 0 }).collect();
    summary.notes = (0..20).map(|i| NoteLine { text: "很长的笔记".repeat(i + 1) }).collect();
    summary.todo_stats = TodoStats { completed: 10, total: 20 };
    summary.note_count = 20;
    let card = CardRenderer::with_engine(BlockGlyphs::new()).render(&summary).unwrap();
    let pixmap = Pixmap::decode_png(&card.image_bytes).unwrap();
    assert_eq!(pixmap.width(), 1080);
}
