use crate::constants::{DEFAULT_BASE_URL, DEFAULT_BUCKET, DEFAULT_STORAGE_DIR};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "workout-images",
    about = "Validate, compress and store workout photos",
    long_about = "workout-images ingests user-selected photos for workout records. \
                  It checks the file type and name, recompresses anything over the 1 MiB budget \
                  (resizing to at most 1080 px and lowering quality step by step), stores the result \
                  under a unique, storage-safe name and prints its public URL.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    workout-images upload leg-press.png --storage-dir ./storage\n  \
    workout-images delete http://localhost:8080/storage/v1/object/public/workout_images/leg_press_1700000000000.png\n  \
    workout-images compress photo.jpg small.jpg --max-size 524288\n  \
    workout-images limits"
)]
pub struct Args {
    #[arg(short = 'q', long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print debug diagnostics")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StorageArgs {
    #[arg(
        short = 's',
        long,
        default_value = DEFAULT_STORAGE_DIR,
        help = "Directory holding one folder per bucket"
    )]
    pub storage_dir: PathBuf,

    #[arg(
        short = 'u',
        long,
        default_value = DEFAULT_BASE_URL,
        help = "Base URL the storage directory is served under"
    )]
    pub base_url: String,

    #[arg(short = 'b', long, default_value = DEFAULT_BUCKET, help = "Bucket name")]
    pub bucket: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Upload an image, compressing it first if it exceeds the size budget",
        long_about = "Validate, optionally recompress, and store an image. \
                      Prints the public URL to save with the workout record."
    )]
    Upload {
        #[arg(help = "Image file path to upload")]
        input: PathBuf,

        #[arg(
            short = 't',
            long,
            help = "Declared MIME type (default: inferred from extension)",
            long_help = "Declared MIME type of the file. Accepted: image/jpeg, image/png, image/gif, image/webp. \
                         When omitted, the type is inferred from the file extension."
        )]
        media_type: Option<String>,

        #[arg(long, help = "Size budget in bytes (default: 1048576)")]
        max_size: Option<u64>,

        #[arg(long, help = "Use bisection instead of a linear quality scan")]
        bisect: bool,

        #[command(flatten)]
        storage: StorageArgs,
    },

    #[command(
        about = "Delete a stored image by its public URL",
        long_about = "Delete the object behind a public URL issued by `upload`. \
                      URLs outside the bucket are ignored and failures are only logged."
    )]
    Delete {
        #[arg(help = "Public URL returned by upload")]
        reference: String,

        #[command(flatten)]
        storage: StorageArgs,
    },

    #[command(
        about = "Compress an image under a byte budget without uploading it",
        long_about = "Run only the compressor: resize to the dimension cap and lower JPEG quality \
                      from 0.8 in steps of 0.1 until the output fits the budget or reaches 0.1."
    )]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(help = "Output image file path")]
        output: PathBuf,

        #[arg(long, help = "Size budget in bytes (default: 1048576)")]
        max_size: Option<u64>,

        #[arg(
            short = 'd',
            long,
            help = "Longest side after resizing (default: 1080)"
        )]
        max_dimension: Option<u32>,

        #[arg(long, help = "Use bisection instead of a linear quality scan")]
        bisect: bool,
    },

    #[command(about = "Show accepted file types and the size limit")]
    Limits,
}
