mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use std::time::Duration;

use common::{stream, FakeMediaServer, UnavailableTranslator, UppercaseTranslator, ASS_DOCUMENT, SRT_DOCUMENT};
use jellysub::error::{ErrorKind, JobStage};
use jellysub::output::OutputStore;
use jellysub::pipeline::SubtitlePipeline;
use jellysub::poll::PollLoop;
use jellysub::pool::{DirectDispatch, WorkerPool};
use jellysub::walker::LibraryWalker;

fn library() -> FakeMediaServer {
    FakeMediaServer::new()
        .folder(None, "show")
        .video(Some("show"), "ep1", vec![stream(2, "eng", "srt"), stream(3, "eng", "ass")], ASS_DOCUMENT)
        .video(Some("show"), "ep2", vec![stream(2, "eng", "subrip")], "this is not a subtitle file")
        .video(Some("show"), "ep3", vec![stream(2, "eng", "subrip")], SRT_DOCUMENT)
        .video(None, "movie", vec![stream(2, "eng", "ass"), stream(3, "chi", "srt")], ASS_DOCUMENT)
        .video(None, "bonus", Vec::new(), "")
}

fn decode(data: &str) -> String {
    String::from_utf8(STANDARD.decode(data).unwrap()).unwrap()
}

#[tokio::test]
async fn scan_cycle_translates_every_candidate_despite_failures() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(library());
    let translator = Arc::new(UppercaseTranslator::default());

    let pipeline = SubtitlePipeline::new(server.clone(), translator.clone(), "chi")
        .with_batch_size(10)
        .with_store(Some(OutputStore::new(dir.path())));
    let pool = WorkerPool::new(Arc::new(pipeline), 2, 4);
    let poll = PollLoop::new(LibraryWalker::new(server.clone()), Duration::from_secs(3600));

    let stats = poll.run_cycle(&pool).await;
    pool.shutdown().await;

    // ep1, ep2, ep3 and movie carry subtitles
    assert_eq!(stats.items_dispatched, 4);
    assert_eq!(stats.failures, 0);

    let mut uploads = server.uploads();
    uploads.sort_by(|a, b| a.0.cmp(&b.0));
    let ids: Vec<&str> = uploads.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["ep1", "ep3"]);

    let (_, ass) = &uploads[0];
    assert_eq!(ass.format, "ass");
    assert_eq!(ass.language, "chi");
    assert!(!ass.is_forced);
    let document = decode(&ass.data);
    assert!(document.contains(",,{\\an8}WHERE ARE YOU GOING?\n"));
    assert!(document.contains(",,HOME.\n"));
    assert!(document.contains("Style: Default,Arial,20,&H00FFFFFF\n"));

    let (_, srt) = &uploads[1];
    assert_eq!(srt.format, "srt");
    assert_eq!(
        decode(&srt.data),
        "1\n00:00:01,000 --> 00:00:02,500\nGOOD MORNING.\n\n2\n00:00:03,000 --> 00:00:04,000\nSEE YOU LATER.\n\n"
    );

    let saved = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(saved, 2);
}

#[tokio::test]
async fn direct_dispatch_walks_and_translates_in_library_order() {
    let server = Arc::new(library());
    let translator = Arc::new(UppercaseTranslator::default());
    let pipeline = SubtitlePipeline::new(server.clone(), translator.clone(), "chi");
    let dispatcher = DirectDispatch::new(Arc::new(pipeline));

    let stats = LibraryWalker::new(server.clone()).walk(None, &dispatcher).await;

    assert_eq!(stats.items_dispatched, 4);
    let ids: Vec<String> = server.uploads().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["ep1", "ep3"]);
    // batch size 1: one request per dialogue event or cue
    assert_eq!(translator.calls(), 4);
}

#[tokio::test]
async fn malformed_documents_never_reach_the_translator() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(
        FakeMediaServer::new()
            .video(None, "bad-srt", vec![stream(2, "eng", "srt")], "1\nnot a timing line\nHello\n")
            .video(None, "bad-ass", vec![stream(2, "eng", "ass")], "[Script Info]\nTitle: empty\n"),
    );
    let translator = Arc::new(UppercaseTranslator::default());
    let pipeline = SubtitlePipeline::new(server.clone(), translator.clone(), "chi")
        .with_store(Some(OutputStore::new(dir.path())));

    for id in ["bad-srt", "bad-ass"] {
        let failure = pipeline
            .process_item(server.detail(id))
            .await
            .expect("item is a candidate")
            .unwrap_err();
        assert_eq!(failure.stage, JobStage::Extract);
        assert_eq!(failure.kind, ErrorKind::Format);
    }

    assert_eq!(translator.calls(), 0);
    assert!(server.uploads().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn backend_failure_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeMediaServer::new().video(None, "ep3", vec![stream(2, "eng", "srt")], SRT_DOCUMENT));
    let pipeline = SubtitlePipeline::new(server.clone(), Arc::new(UnavailableTranslator), "chi")
        .with_store(Some(OutputStore::new(dir.path())));

    let failure = pipeline
        .process_item(server.detail("ep3"))
        .await
        .expect("item is a candidate")
        .unwrap_err();

    assert_eq!(failure.stage, JobStage::Translate);
    assert_eq!(failure.kind, ErrorKind::Backend);
    assert!(server.uploads().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn upload_failure_keeps_local_copy() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(
        FakeMediaServer::new()
            .video(None, "ep1", vec![stream(2, "eng", "srt")], SRT_DOCUMENT)
            .failing_upload("ep1"),
    );
    let pipeline = SubtitlePipeline::new(server.clone(), Arc::new(UppercaseTranslator::default()), "chi")
        .with_store(Some(OutputStore::new(dir.path())));

    let failure = pipeline
        .process_item(server.detail("ep1"))
        .await
        .expect("item is a candidate")
        .unwrap_err();

    assert_eq!(failure.stage, JobStage::Upload);
    assert_eq!(failure.kind, ErrorKind::Network);
    let saved = dir.path().join("Video ep1.chi.srt");
    assert!(std::fs::read_to_string(saved).unwrap().contains("GOOD MORNING."));
}

#[tokio::test]
async fn local_only_mode_skips_upload() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeMediaServer::new().video(None, "ep3", vec![stream(4, "jpn", "ass")], ASS_DOCUMENT));
    let pipeline = SubtitlePipeline::new(server.clone(), Arc::new(UppercaseTranslator::default()), "chi")
        .with_upload(false)
        .with_store(Some(OutputStore::new(dir.path())));

    let document = pipeline
        .process_item(server.detail("ep3"))
        .await
        .expect("item is a candidate")
        .unwrap();

    assert!(!document.uploaded);
    assert_eq!(document.saved_to, Some(dir.path().join("Video ep3.chi.ass")));
    assert!(server.uploads().is_empty());
}

#[tokio::test]
async fn items_with_target_track_are_skipped() {
    let server = Arc::new(library());
    let translator = Arc::new(UppercaseTranslator::default());
    let pipeline = SubtitlePipeline::new(server.clone(), translator.clone(), "chi");

    assert!(pipeline.process_item(server.detail("movie")).await.is_none());
    assert!(pipeline.process_item(server.detail("bonus")).await.is_none());
    assert_eq!(translator.calls(), 0);
}
