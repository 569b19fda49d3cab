use peakclip_cli::PipelineConfig;
use peakclip_media::{check_ffmpeg, check_ffprobe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env();

    println!(
        "peakclip-selfcheck: max_parallel={} chunk_seconds={} min_rms={}",
        config.max_parallel, config.chunk_seconds, config.min_rms
    );

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    ensure_runs(&ffmpeg).await?;
    println!("peakclip-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    println!("peakclip-selfcheck: ok");
    Ok(())
}

async fn ensure_runs(binary: &std::path::Path) -> anyhow::Result<()> {
    let output = tokio::process::Command::new(binary)
        .arg("-version")
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("{} not runnable: {}", binary.display(), e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            binary.display(),
            output.status
        ));
    }
    Ok(())
}
