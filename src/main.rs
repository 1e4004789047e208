mod app;
mod i18n;
mod model;
mod services;
mod store;
mod theme;
mod ui;
mod widgets;

fn main() -> anyhow::Result<()> {
    ui::run()
}
