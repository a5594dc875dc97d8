use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use std::path::Path;
use workout_images::cli::{Args, Commands, StorageArgs};
use workout_images::constants::{
    INFO_PREFIX, MAX_UPLOAD_SIZE, ORIGINAL_SIZE_PREFIX, SUCCESS_PREFIX,
};
use workout_images::logger::{init_tracing, is_quiet, set_quiet_mode, set_verbose_mode};
use workout_images::utils::{create_upload_progress_bar, format_file_size, print_size_summary};
use workout_images::{
    accept_filter, Compressor, CompressorOptions, ImageUploader, LocalStorage, SearchStrategy,
    SourceFile, UploaderConfig,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    set_quiet_mode(args.quiet);
    set_verbose_mode(args.verbose);
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        workout_images::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Upload { input, media_type, max_size, bisect, storage } => {
            upload_image(&input, media_type, max_size, bisect, storage).await?;
        }
        Commands::Delete { reference, storage } => {
            delete_image(&reference, storage).await?;
        }
        Commands::Compress { input, output, max_size, max_dimension, bisect } => {
            compress_image(&input, &output, max_size, max_dimension, bisect).await?;
        }
        Commands::Limits => show_limits(),
    }

    Ok(())
}

fn strategy(bisect: bool) -> Option<SearchStrategy> {
    bisect.then_some(SearchStrategy::Bisection)
}

async fn build_uploader(
    storage: StorageArgs,
    max_size: Option<u64>,
    compressor: Option<CompressorOptions>,
) -> Result<ImageUploader<LocalStorage>> {
    let backend = LocalStorage::new(&storage.storage_dir, storage.base_url)
        .await
        .with_context(|| format!("Cannot open storage directory {:?}", storage.storage_dir))?;
    let config = UploaderConfig::new(Some(storage.bucket), max_size, compressor);
    Ok(ImageUploader::new(backend, config))
}

async fn upload_image(
    input: &Path,
    media_type: Option<String>,
    max_size: Option<u64>,
    bisect: bool,
    storage: StorageArgs,
) -> Result<()> {
    workout_images::info!("📤 Uploading: {:?}", input);

    let compressor = CompressorOptions::new(None, None, strategy(bisect))?;
    let uploader = build_uploader(storage, max_size, Some(compressor)).await?;

    let file = SourceFile::from_path(input, media_type)
        .await
        .with_context(|| format!("Cannot read {:?}", input))?;
    let original_size = file.size();
    workout_images::info!(
        "{} {} ({})",
        ORIGINAL_SIZE_PREFIX,
        original_size,
        format_file_size(original_size)
    );

    let pb = if is_quiet() {
        ProgressBar::hidden()
    } else {
        create_upload_progress_bar("Uploading...")
    };
    let result = uploader
        .upload_with_progress(file, |percent| pb.set_position(u64::from(percent)))
        .await;
    pb.finish_and_clear();
    let result = result?;

    if result.compressed {
        let quality = result
            .quality
            .map(|q| q.to_string())
            .unwrap_or_default();
        workout_images::info!("🗜️  Compressed at quality {}", quality);
        print_size_summary(original_size, result.final_size);
        if result.final_size > uploader.config().max_upload_size {
            workout_images::warn!("Size budget not met even at the lowest quality");
        }
    } else {
        workout_images::info!("{} No compression needed", INFO_PREFIX);
    }

    workout_images::info!("{} Upload successful!", SUCCESS_PREFIX);
    workout_images::verbose!("Storage key: {}", result.key);
    println!("{}", result.url);

    Ok(())
}

async fn delete_image(reference: &str, storage: StorageArgs) -> Result<()> {
    let uploader = build_uploader(storage, None, None).await?;
    uploader.delete_by_reference(reference).await;
    workout_images::info!("{} Delete requested for {}", SUCCESS_PREFIX, reference);
    Ok(())
}

async fn compress_image(
    input: &Path,
    output: &Path,
    max_size: Option<u64>,
    max_dimension: Option<u32>,
    bisect: bool,
) -> Result<()> {
    workout_images::info!("🗜️  Compressing image: {:?}", input);
    workout_images::info!("📁 Output: {:?}", output);

    let max_size = max_size.filter(|&s| s > 0).unwrap_or(MAX_UPLOAD_SIZE);
    let options = CompressorOptions::new(max_dimension, None, strategy(bisect))?;
    let compressor = Compressor::new(options);

    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("Cannot read {:?}", input))?;
    let original_size = data.len() as u64;
    workout_images::info!(
        "{} {} ({})",
        ORIGINAL_SIZE_PREFIX,
        original_size,
        format_file_size(original_size)
    );

    let result = tokio::task::spawn_blocking(move || compressor.compress_bytes(&data, max_size))
        .await
        .context("Compression task failed")??;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Cannot create output directory {:?}", parent))?;
    }
    tokio::fs::write(output, &result.bytes)
        .await
        .with_context(|| format!("Cannot write {:?}", output))?;

    workout_images::info!(
        "📏 {}x{} at quality {} after {} attempt(s)",
        result.width,
        result.height,
        result.quality,
        result.attempts
    );
    print_size_summary(original_size, result.len());
    if result.len() > max_size {
        workout_images::warn!("Size budget not met even at the lowest quality");
    } else {
        workout_images::info!("{} Compression complete", SUCCESS_PREFIX);
    }

    Ok(())
}

fn show_limits() {
    println!("{} Accepted types: {}", INFO_PREFIX, accept_filter());
    println!(
        "{} Maximum size: 1 MiB ({} bytes); larger images are compressed automatically",
        INFO_PREFIX, MAX_UPLOAD_SIZE
    );
}
