use std::cell::RefCell;
use std::rc::Rc;

use tts_transport::{
    AudioExporter, ExportRequest, ManualClock, PlatformError, PlaybackEngine, RequestId,
    SpeechPlatform, SynthesisEvent, Utterance, Voice, VoiceCatalog,
};

/// Prints what a real speech engine would say.
struct ConsolePlatform {
    voices: Vec<Voice>,
}

impl SpeechPlatform for ConsolePlatform {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), PlatformError> {
        println!(
            "  speak {} [{} @ {:.1}x]: {:?}",
            utterance.request, utterance.voice.name, utterance.rate, utterance.text
        );
        Ok(())
    }

    fn cancel(&mut self, request: RequestId) {
        println!("  cancel {request}");
    }
}

fn sine(samples: usize, sample_rate: u32) -> Vec<f32> {
    (0..samples)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin() * 0.2)
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let platform = Rc::new(RefCell::new(ConsolePlatform {
        voices: vec![
            Voice::new("Samantha", "en-US", true),
            Voice::new("Lekha", "hi-IN", true),
        ],
    }));

    let mut catalog = VoiceCatalog::new();
    catalog.refresh_from(&*platform.borrow());
    let languages: Vec<&str> = catalog.languages().iter().map(|l| l.name.as_str()).collect();
    println!("Languages: {languages:?}");

    let language = catalog.select("en-US").ok_or("no language available")?;
    let clock = ManualClock::new();
    let mut engine = PlaybackEngine::with_clock(platform.clone(), clock.clone(), language.clone());

    let text = "Speech engines cannot seek, so this transport restarts synthesis \
                from a proportional character offset whenever the timeline moves.";
    engine.set_text(text);
    println!("Estimated duration: {}", engine.snapshot().duration_label());

    engine.play();
    for _ in 0..3 {
        clock.advance_secs(1.0);
        engine.tick();
        let snapshot = engine.snapshot();
        println!(
            "  {} / {} ({:.0}%)",
            snapshot.elapsed_label(),
            snapshot.duration_label(),
            snapshot.progress_percent()
        );
    }

    println!("Fast forward");
    engine.skip_forward();
    clock.advance_secs(1.0);
    engine.tick();
    println!("  at {}", engine.snapshot().elapsed_label());

    if let Some(request) = engine.active_request() {
        engine.handle_event(SynthesisEvent::Completed(request));
    }
    println!("Status after completion: {:?}", engine.status());

    let mut exporter = AudioExporter::new(platform.clone());
    let request = exporter.start(
        ExportRequest::builder()
            .text(text)
            .language(language)
            .rate(engine.rate())
            .pitch(engine.pitch())
            .build()?,
    )?;
    exporter.handle_event(SynthesisEvent::Audio {
        request,
        samples: sine(24_000, 24_000),
        sample_rate: 24_000,
    });
    if let Some(result) = exporter.handle_event(SynthesisEvent::Completed(request)) {
        let file = result?;
        let path = file.save(&std::env::temp_dir())?;
        println!("Exported {:.1}s of audio to {}", file.duration_secs(), path.display());
    }

    Ok(())
}
