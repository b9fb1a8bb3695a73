//! cvforge – render a résumé and export it as a PDF.
//!
//! Usage:
//!   cvforge <cv.json> [--lang CODE] [--layout NAME] [--out DIR]
//!           [--font TTF] [--bold-font TTF] [--config JSON] [--interactive]
//!
//! Without `--interactive` the document is rendered once for the requested
//! selection and exported into `--out` (default: current directory).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::{env, process};

use cv_forge::fonts::FontManager;
use cv_forge::{
    Action, ControlSurface, CvDocument, DirectoryDownloader, Language, Layout, Notice,
    PipelineConfig, Selection,
};

struct Options {
    input: PathBuf,
    selection: Selection,
    out_dir: PathBuf,
    font: Option<PathBuf>,
    bold_font: Option<PathBuf>,
    config: Option<PathBuf>,
    interactive: bool,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let opts = parse_args(&args);

    let document = CvDocument::load(&opts.input).unwrap_or_else(|e| fail(&e.to_string()));

    let config = match &opts.config {
        Some(path) => PipelineConfig::load(path).unwrap_or_else(|e| fail(&e.to_string())),
        None => PipelineConfig::default(),
    };

    let mut fonts = FontManager::new();
    match &opts.font {
        Some(path) => {
            if let Err(e) = fonts.load_font_file(path, false) {
                fail(&e.to_string());
            }
        }
        None => {
            fonts.discover_system_fonts();
        }
    }
    if let Some(path) = &opts.bold_font {
        if let Err(e) = fonts.load_font_file(path, true) {
            fail(&e.to_string());
        }
    }

    let downloader = DirectoryDownloader::new(opts.out_dir.clone());
    let mut control = ControlSurface::new(document, fonts, config, Box::new(downloader))
        .with_selection(opts.selection);

    if let Notice::RenderFailed(reason) = control.mount() {
        fail(&format!("rendering failed: {reason}"));
    }

    if opts.interactive {
        run_interactive(&mut control);
    } else {
        let started = control.dispatch(Action::Export);
        if !matches!(started, Notice::ExportStarted { .. }) {
            fail(&started.to_string());
        }
        match control.wait_for_export() {
            Some(done @ Notice::Exported { .. }) => eprintln!("{done}"),
            Some(other) => fail(&other.to_string()),
            None => fail("export did not run"),
        }
    }
}

fn run_interactive(control: &mut ControlSurface) {
    eprintln!("Type 'help' for commands.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if let Some(notice) = control.poll() {
            eprintln!("{notice}");
        }
        eprint!("> ");
        let _ = io::stderr().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {e}");
                break;
            }
            None => break,
        };
        let mut words = line.split_whitespace();
        let action = match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("lang"), Some(code)) => match code.parse::<Language>() {
                Ok(language) => Action::SelectLanguage(language),
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            },
            (Some("layout"), Some(name)) => match name.parse::<Layout>() {
                Ok(layout) => Action::SelectLayout(layout),
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            },
            (Some("export"), None) => Action::Export,
            (Some("status"), None) => {
                print_status(control);
                continue;
            }
            (Some("help"), None) => {
                print_commands();
                continue;
            }
            (Some("quit" | "exit"), None) => break,
            _ => {
                eprintln!("Unknown command: {line}");
                continue;
            }
        };
        let notice = control.dispatch(action);
        if !notice.is_silent() {
            eprintln!("{notice}");
        }
    }

    if let Some(notice) = control.wait_for_export() {
        eprintln!("{notice}");
    }
}

fn print_status(control: &ControlSurface) {
    let sel = control.selection();
    eprintln!("language: {} ({})", sel.language, sel.language.label());
    eprintln!("layout:   {}", sel.layout);
    if let Some(surface) = control.surface() {
        eprintln!("surface:  {} x {} px", surface.width, surface.height);
    }
    eprintln!(
        "export:   {}",
        if control.is_exporting() { "running" } else { "idle" }
    );
}

fn print_commands() {
    eprintln!("  lang <en|fr|de|ar|it>   switch language");
    eprintln!("  layout <compact|full>   switch layout");
    eprintln!("  export                  write the PDF for the current view");
    eprintln!("  status                  show the current selection");
    eprintln!("  quit                    leave (waits for a running export)");
}

fn parse_args(args: &[String]) -> Options {
    let prog = args.first().map(String::as_str).unwrap_or("cvforge");
    let mut input: Option<PathBuf> = None;
    let mut opts = Options {
        input: PathBuf::new(),
        selection: Selection::default(),
        out_dir: PathBuf::from("."),
        font: None,
        bold_font: None,
        config: None,
        interactive: false,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| match iter.next() {
            Some(v) => v.clone(),
            None => {
                eprintln!("Missing value for {flag}");
                print_usage(prog);
                process::exit(1);
            }
        };
        match arg.as_str() {
            "--lang" | "-l" => {
                opts.selection.language = value(arg.as_str())
                    .parse()
                    .unwrap_or_else(|e: cv_forge::error::SelectionError| fail(&e.to_string()));
            }
            "--layout" => {
                opts.selection.layout = value(arg.as_str())
                    .parse()
                    .unwrap_or_else(|e: cv_forge::error::SelectionError| fail(&e.to_string()));
            }
            "--out" | "-o" => opts.out_dir = PathBuf::from(value(arg.as_str())),
            "--font" => opts.font = Some(PathBuf::from(value(arg.as_str()))),
            "--bold-font" => opts.bold_font = Some(PathBuf::from(value(arg.as_str()))),
            "--config" => opts.config = Some(PathBuf::from(value(arg.as_str()))),
            "--interactive" | "-i" => opts.interactive = true,
            "--help" | "-h" => {
                print_usage(prog);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(prog);
                process::exit(1);
            }
            path => {
                if input.is_some() {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(prog);
                    process::exit(1);
                }
                input = Some(PathBuf::from(path));
            }
        }
    }

    match input {
        Some(path) => opts.input = path,
        None => {
            eprintln!("Error: no CV data file specified.");
            print_usage(prog);
            process::exit(1);
        }
    }
    opts
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("cvforge – localized résumé to PDF");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <cv.json> [--lang CODE] [--layout NAME] [--out DIR] [--interactive]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --lang, -l      en, fr, de, ar or it (default: en)");
    eprintln!("  --layout        compact or full (default: full)");
    eprintln!("  --out, -o       Directory the PDF is written to (default: .)");
    eprintln!("  --font          Regular TTF/OTF face (default: probe system fonts)");
    eprintln!("  --bold-font     Bold TTF/OTF face");
    eprintln!("  --config        Pipeline config JSON (scale, jpeg_quality, ...)");
    eprintln!("  --interactive   Read commands from stdin; type 'help' for a list");
    eprintln!("  --help          Print this message");
}
