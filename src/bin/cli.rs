use clap::Parser;
use mapview::assets::AssetSet;
use mapview::country::{load_ownership, CountryTable};
use mapview::province::load_province_defs;
use mapview::{MapConfig, MapEngine};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Просмотрщик политической карты для Chronicles of Realms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: PathBuf,

    /// Путь для сохранения кадра (по умолчанию: ./frame.png)
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Размер окна просмотра, ШИРИНАxВЫСОТА
    #[arg(long, default_value = "1280x720")]
    viewport: String,

    /// Идентификатор провинции для подсветки выбора
    #[arg(long)]
    select: Option<String>,

    /// Фактор зума к центру окна (применяется после reset)
    #[arg(long)]
    zoom: Option<f64>,

    /// Дополнительно сохранить политический слой и маску границ рядом с кадром
    #[arg(long)]
    layers: bool,
}

fn parse_viewport(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("ожидается ШИРИНАxВЫСОТА, получено '{value}'"))?;
    let w = w.parse().map_err(|_| format!("некорректная ширина '{w}'"))?;
    let h = h.parse().map_err(|_| format!("некорректная высота '{h}'"))?;
    Ok((w, h))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let (viewport_w, viewport_h) = parse_viewport(&cli.viewport)?;

    println!("🔍 Загрузка конфигурации...");
    let config = MapConfig::from_toml_file(&cli.config)?;

    println!(
        "Загрузка ассетов (карта {}×{})...",
        config.width, config.height
    );
    let assets = AssetSet::load(&config)?;
    let defs = load_province_defs(&config.assets.province_defs)?;
    let countries = CountryTable::load(&config.assets.countries)?;
    let ownership = load_ownership(&config.assets.ownership)?;

    println!(
        "Сборка движка: {} провинций, {} стран, {} записей владения...",
        defs.len(),
        countries.len(),
        ownership.len()
    );
    let mut engine = MapEngine::new(config, assets, &defs, countries)?;
    engine.resize(viewport_w, viewport_h);
    engine.reset_camera();
    engine.reload_ownership(&ownership)?;

    // доводим пакетный пересчёт якорей до конца
    while !engine.tick(mapview::label::placer::DEFAULT_BATCH) {}

    if let Some(factor) = cli.zoom {
        engine.zoom_at(
            f64::from(viewport_w) / 2.0,
            f64::from(viewport_h) / 2.0,
            factor,
        );
    }
    if let Some(id) = cli.select {
        engine.set_selection(Some(id));
    }

    println!("Композитинг кадра {viewport_w}×{viewport_h}...");
    let frame = engine.render_frame();
    frame.save(&cli.output)?;
    println!("Кадр сохранён в {:?}", cli.output);
    println!("Подписей размещено: {}", engine.labels().len());

    if cli.layers {
        let stem = cli.output.with_extension("");
        let political = format!("{}_political.png", stem.display());
        let borders = format!("{}_borders.png", stem.display());
        engine.political_raster().save_as_png(&political)?;
        engine.border_mask().save_as_png(&borders)?;
        println!("Слои сохранены: {political}, {borders}");
    }

    println!("\nГотово!");
    Ok(())
}
