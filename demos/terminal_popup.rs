//! Terminal popup demo.
//!
//! Three triggers stacked at the top-left: one opens on hover, one on
//! click, one on click with Escape support. Wheel scrolling dismisses the
//! click popup. Press `q` to quit.
//!
//! ```bash
//! cargo run --example terminal_popup
//! ```

use std::io::{Write, stdout};
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style};

use spark_popup::{
    Element, HostContext, Interaction, LayoutDocument, Placement, PointerRouter, Popup,
    PopupProps, Viewport,
};

fn main() -> std::io::Result<()> {
    let (width, height) = terminal::size()?;
    let doc = LayoutDocument::new(Viewport::new(width as f64, height as f64));
    let host = HostContext::new(doc.clone());
    let router = PointerRouter::new(host.clone());

    let popups = build_popups(&host).map_err(|err| std::io::Error::other(err.to_string()))?;

    terminal::enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

    let result = run(&doc, &host, &router);

    execute!(stdout(), cursor::Show, DisableMouseCapture, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    drop(popups);
    result
}

fn build_popups(host: &HostContext) -> spark_popup::Result<Vec<Popup>> {
    let hover = Popup::new(
        host.clone(),
        PopupProps::new(Element::new("button").text("[ hover me ]"))
            .content(Element::new("span").text("opens after 50ms of hover"))
            .position(Placement::RightCenter)
            .hoverable(true),
    )?;

    let click = Popup::new(
        host.clone(),
        PopupProps::new(Element::new("button").text("[ click me ]"))
            .content(Element::new("span").text("click anywhere else to close"))
            .position(Placement::BottomLeft)
            .on(Interaction::CLICK)
            .hide_on_scroll(true),
    )?;

    let escape = Popup::new(
        host.clone(),
        PopupProps::new(Element::new("button").text("[ esc closes ]"))
            .child(Element::new("span").text("press Esc"))
            .child(Element::new("span").text("or click the trigger again"))
            .position(Placement::BottomLeft)
            .offset(-2.0, 1.0)
            .on(Interaction::CLICK)
            .close_on_escape(true),
    )?;

    Ok(vec![hover, click, escape])
}

fn run(doc: &LayoutDocument, host: &HostContext, router: &PointerRouter) -> std::io::Result<()> {
    let mut last = Instant::now();
    loop {
        draw(doc)?;

        if event::poll(Duration::from_millis(16))? {
            let event = event::read()?;
            match &event {
                Event::Key(key) if key.code == KeyCode::Char('q') => return Ok(()),
                Event::Resize(w, h) => doc.resize(*w as f64, *h as f64),
                _ => {}
            }
            router.handle(&event);
        }

        let now = Instant::now();
        host.timers.advance(now - last);
        last = now;
    }
}

fn draw(doc: &LayoutDocument) -> std::io::Result<()> {
    let mut out = stdout();
    queue!(out, terminal::Clear(terminal::ClearType::All))?;

    for node in doc.snapshot() {
        let Some(text) = node.text.as_deref() else {
            continue;
        };
        if node.rect.left < 0.0 || node.rect.top < 0.0 {
            continue;
        }
        queue!(out, cursor::MoveTo(node.rect.left as u16, node.rect.top as u16))?;
        if node.depth > 0 {
            queue!(out, style::SetAttribute(style::Attribute::Reverse))?;
        }
        queue!(
            out,
            style::Print(text),
            style::SetAttribute(style::Attribute::Reset)
        )?;
    }
    out.flush()
}
