use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use ilm_games::config::Settings;
use ilm_games::maze::{self, Dir};
use ilm_games::session::{Feedback, MazeRun, Phase, WordHunt};
use ilm_games::store::{load_progress, save_progress, FileStore, Progress};
use ilm_games::word_grid::{self, Alphabet, Direction};
use ilm_games::Pos;

const CELL_W: usize = 2;
const FEEDBACK_MS: u64 = 600;
const MAZE_KEY: &str = "maze";
const WORDS_KEY: &str = "words";

const LATIN_WORDS: [&str; 10] = [
    "SALAH", "ZAKAH", "SAWM", "HAJJ", "IMAN", "IHSAN", "TAWBAH", "SABR", "SHUKR", "DUA",
];
const ARABIC_WORDS: [&str; 8] = ["صلاة", "زكاة", "صوم", "حج", "ايمان", "صبر", "شكر", "دعاء"];

#[derive(Clone, Debug, PartialEq)]
enum Mode {
    Maze,
    Words(Vec<String>),
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Goal,
    Wall,
    Empty,
    Letter(char),
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    fg: Color,
    bg: Color,
}

impl Cell {
    fn new(glyph: Glyph, fg: Color) -> Self {
        Self {
            glyph,
            fg,
            bg: Color::Reset,
        }
    }

    fn on(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }
}

struct WordsView {
    hunt: WordHunt,
    cursor: Pos,
    anchor: Option<Pos>,
    flash: Option<(Feedback, Vec<Pos>, Instant)>,
}

enum Game {
    Maze(MazeRun),
    Words(WordsView),
}

impl Game {
    fn width(&self) -> usize {
        match self {
            Game::Maze(run) => run.maze().cols(),
            Game::Words(view) => view.hunt.puzzle().cols(),
        }
    }

    fn height(&self) -> usize {
        match self {
            Game::Maze(run) => run.maze().rows(),
            Game::Words(view) => view.hunt.puzzle().rows(),
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Game::Maze(run) => run.session().phase(),
            Game::Words(view) => view.hunt.session().phase(),
        }
    }

    fn tick(&mut self, now: Instant) -> Phase {
        match self {
            Game::Maze(run) => run.tick(now),
            Game::Words(view) => {
                if let Some((_, _, at)) = view.flash {
                    if now.duration_since(at) >= Duration::from_millis(FEEDBACK_MS) {
                        view.flash = None;
                    }
                }
                view.hunt.tick(now)
            }
        }
    }
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    last_footer: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![Cell::new(Glyph::Empty, Color::Reset); width * height],
            last_hud: String::new(),
            last_footer: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let settings = Settings::from_env();
    let mode = match parse_mode(std::env::args().skip(1)) {
        Some(mode) => mode,
        None => {
            eprintln!("usage: ilm-games maze | ilm-games words [WORD...]");
            return Ok(());
        }
    };

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &settings, &mode);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn parse_mode(mut args: impl Iterator<Item = String>) -> Option<Mode> {
    match args.next().as_deref() {
        None | Some("maze") => Some(Mode::Maze),
        Some("words") => Some(Mode::Words(args.collect())),
        Some(_) => None,
    }
}

fn run(stdout: &mut Stdout, settings: &Settings, mode: &Mode) -> io::Result<()> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut store = FileStore::new(settings.store_path.clone());
    let mut progress = load_progress(&store);
    let mut game = new_game(settings, mode, &mut rng).map_err(io::Error::other)?;
    let mut renderer = Renderer::new(game.width(), game.height());
    let mut saved = false;
    let frame_time = Duration::from_micros(1_000_000 / settings.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                let now = Instant::now();
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('n') => {
                        game = new_game(settings, mode, &mut rng).map_err(io::Error::other)?;
                        renderer = Renderer::new(game.width(), game.height());
                        saved = false;
                    }
                    code => handle_key(&mut game, code, now),
                }
            }
        }

        let now = Instant::now();
        if game.tick(now) == Phase::Complete && !saved {
            saved = true;
            record_result(&game, now, &mut progress, &mut store);
        }
        render(stdout, &game, &progress, &mut renderer, now)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn new_game(settings: &Settings, mode: &Mode, rng: &mut StdRng) -> ilm_games::Result<Game> {
    match mode {
        Mode::Maze => {
            let maze = maze::generate(
                settings.maze_rows,
                settings.maze_cols,
                settings.difficulty,
                rng,
            )?;
            info!(
                "new {}x{} {} maze",
                maze.rows(),
                maze.cols(),
                settings.difficulty
            );
            Ok(Game::Maze(MazeRun::new(maze, settings.time_limit)))
        }
        Mode::Words(words) => {
            let words: Vec<String> = if words.is_empty() {
                default_words(&settings.placer.alphabet)
            } else {
                words.clone()
            };
            let order = word_grid::shuffle_words(&words, rng);
            let puzzle = word_grid::place_words(
                &order,
                settings.word_rows,
                settings.word_cols,
                &settings.placer,
                rng,
            )?;
            if !puzzle.unplaced().is_empty() {
                info!("words left out of this grid: {:?}", puzzle.unplaced());
            }
            Ok(Game::Words(WordsView {
                hunt: WordHunt::new(puzzle, settings.time_limit),
                cursor: Pos::new(0, 0),
                anchor: None,
                flash: None,
            }))
        }
    }
}

fn default_words(alphabet: &Alphabet) -> Vec<String> {
    let words: &[&str] = if *alphabet == Alphabet::arabic() {
        &ARABIC_WORDS
    } else {
        &LATIN_WORDS
    };
    words.iter().map(|w| w.to_string()).collect()
}

fn handle_key(game: &mut Game, code: KeyCode, now: Instant) {
    let dir = match code {
        KeyCode::Char('k') | KeyCode::Up => Some(Dir::Up),
        KeyCode::Char('j') | KeyCode::Down => Some(Dir::Down),
        KeyCode::Char('h') | KeyCode::Left => Some(Dir::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Dir::Right),
        _ => None,
    };
    match game {
        Game::Maze(run) => {
            if let Some(dir) = dir {
                run.step(dir, now);
            }
        }
        Game::Words(view) => {
            view.hunt.start(now);
            if let Some(dir) = dir {
                let puzzle = view.hunt.puzzle();
                if let Some(next) = view.cursor.offset(dir.delta(), 1) {
                    if next.row < puzzle.rows() && next.col < puzzle.cols() {
                        view.cursor = next;
                    }
                }
                return;
            }
            match code {
                KeyCode::Char(' ') | KeyCode::Enter => match view.anchor.take() {
                    None => view.anchor = Some(view.cursor),
                    Some(anchor) => {
                        let feedback = view.hunt.select(anchor, view.cursor, now);
                        if feedback != Feedback::Ignored {
                            view.flash = Some((feedback, line_cells(anchor, view.cursor), now));
                        }
                    }
                },
                KeyCode::Esc => view.anchor = None,
                _ => {}
            }
        }
    }
}

fn line_cells(start: Pos, end: Pos) -> Vec<Pos> {
    let Some(direction) = Direction::between(start, end) else {
        return vec![start, end];
    };
    let len = start.row.abs_diff(end.row).max(start.col.abs_diff(end.col));
    (0..=len)
        .filter_map(|i| start.offset(direction.delta(), i))
        .collect()
}

/// A finished game that was actually played through, not timed out or empty.
fn solved(game: &Game) -> bool {
    match game {
        Game::Maze(run) => run.player() == run.maze().goal(),
        Game::Words(view) => {
            let total = view.hunt.puzzle().placed().len();
            total > 0 && view.hunt.found_count() == total
        }
    }
}

fn record_result(game: &Game, now: Instant, progress: &mut Progress, store: &mut FileStore) {
    if !solved(game) {
        return;
    }
    let (key, moves, session) = match game {
        Game::Maze(run) => (MAZE_KEY, run.moves(), run.session()),
        Game::Words(view) => {
            let session = view.hunt.session();
            (WORDS_KEY, session.correct() + session.incorrect(), session)
        }
    };
    let time_ms = session.elapsed(now).as_millis() as u64;
    progress.record_completion(key, moves, time_ms);
    if let Err(err) = save_progress(store, progress) {
        warn!("could not save progress to {}: {}", store.path().display(), err);
    }
}

fn render(
    stdout: &mut Stdout,
    game: &Game,
    progress: &Progress,
    renderer: &mut Renderer,
    now: Instant,
) -> io::Result<()> {
    let needed_h = (game.height() + 3) as u16;
    let needed_w = (game.width() * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let hud = hud_line(game, progress, now);
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for row in 0..game.height() {
        for col in 0..game.width() {
            let pos = Pos::new(row, col);
            let cell = cell_for(game, pos);
            let idx = row * game.width() + col;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, col, row, cell)?;
            }
        }
    }

    let footer = footer_line(game);
    if renderer.needs_full || footer != renderer.last_footer {
        stdout.queue(MoveTo(
            renderer.origin_x,
            renderer.origin_y + game.height() as u16 + 1,
        ))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&footer))?;
        renderer.last_footer = footer;
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn hud_line(game: &Game, progress: &Progress, now: Instant) -> String {
    let (key, session, status) = match game {
        Game::Maze(run) => (
            MAZE_KEY,
            run.session(),
            format!("Maze  Moves: {}  Bumps: {}", run.moves(), run.session().incorrect()),
        ),
        Game::Words(view) => (
            WORDS_KEY,
            view.hunt.session(),
            format!(
                "Words  Found: {}/{}",
                view.hunt.found_count(),
                view.hunt.puzzle().placed().len()
            ),
        ),
    };
    let clock = match session.remaining(now) {
        Some(left) => format!("Left: {}s", left.as_secs()),
        None => format!("Time: {}s", session.elapsed(now).as_secs()),
    };
    let best = progress
        .record(key)
        .and_then(|r| r.best_time_ms)
        .map(|ms| format!("  Best: {:.1}s", ms as f64 / 1000.0))
        .unwrap_or_default();
    let tail = match game.phase() {
        Phase::Complete if session.timed_out() => "  TIME UP (n new, q quit)",
        Phase::Complete => "  COMPLETE (n new, q quit)",
        _ => "  (q to quit)",
    };
    format!("{}  {}{}{}", status, clock, best, tail)
}

fn footer_line(game: &Game) -> String {
    match game {
        Game::Maze(_) => "hjkl/arrows move, n new maze".to_string(),
        Game::Words(view) => {
            let words: Vec<String> = view
                .hunt
                .puzzle()
                .placed()
                .iter()
                .enumerate()
                .map(|(idx, w)| {
                    if view.hunt.is_found(idx) {
                        format!("[{}]", w.text)
                    } else {
                        w.text.clone()
                    }
                })
                .collect();
            words.join(" ")
        }
    }
}

fn cell_for(game: &Game, pos: Pos) -> Cell {
    match game {
        Game::Maze(run) => {
            let maze = run.maze();
            if pos == run.player() {
                Cell::new(Glyph::Player, Color::Yellow)
            } else if pos == maze.goal() {
                Cell::new(Glyph::Goal, Color::Green)
            } else if maze.is_wall(pos) {
                Cell::new(Glyph::Wall, Color::Blue)
            } else {
                Cell::new(Glyph::Empty, Color::Reset)
            }
        }
        Game::Words(view) => {
            let puzzle = view.hunt.puzzle();
            let glyph = Glyph::Letter(puzzle.letter_at(pos).unwrap_or(' '));
            let found = puzzle
                .placed()
                .iter()
                .enumerate()
                .any(|(idx, w)| view.hunt.is_found(idx) && w.cells.contains(&pos));
            let cell = Cell::new(glyph, if found { Color::Green } else { Color::White });
            if pos == view.cursor {
                return cell.on(Color::DarkYellow);
            }
            if let Some((feedback, cells, _)) = &view.flash {
                if cells.contains(&pos) {
                    let bg = if *feedback == Feedback::Correct {
                        Color::DarkGreen
                    } else {
                        Color::DarkRed
                    };
                    return cell.on(bg);
                }
            }
            if view.anchor == Some(pos) {
                return cell.on(Color::DarkBlue);
            }
            cell
        }
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "@ ".to_string(),
        Glyph::Goal => "⚑ ".to_string(),
        Glyph::Wall => "██".to_string(),
        Glyph::Empty => "  ".to_string(),
        Glyph::Letter(ch) => ch.to_string(),
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.fg))?;
    stdout.queue(SetBackgroundColor(cell.bg))?;
    stdout.queue(Print(&text))?;
    let w = UnicodeWidthStr::width(text.as_str());
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}
