use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use supervisely2voc::archive::archive_outputs;
use supervisely2voc::config::ConversionConfig;
use supervisely2voc::dataset::{annotation_path, collect_images, setup_output_directories};
use supervisely2voc::error::ConvertError;
use supervisely2voc::image_io::{convert_image, source_format};
use supervisely2voc::{convert_dataset, from_xml_str, process_image};

const DOG_JSON: &str =
    r#"{"objects":[{"classTitle":"dog","points":{"exterior":[[5,5],[15,25]]}}]}"#;

struct Fixture {
    _temp: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("my dataset");
        let output = temp.path().join("out");
        fs::create_dir_all(input.join("img")).unwrap();
        fs::create_dir_all(input.join("ann")).unwrap();
        Self {
            _temp: temp,
            input,
            output,
        }
    }

    fn add_png(&self, name: &str, width: u32, height: u32, json: &str) {
        RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 128]))
            .save(self.input.join("img").join(name))
            .unwrap();
        self.add_annotation(name, json);
    }

    fn add_jpg(&self, name: &str, width: u32, height: u32, json: &str) {
        RgbImage::from_pixel(width, height, Rgb([200, 10, 30]))
            .save(self.input.join("img").join(name))
            .unwrap();
        self.add_annotation(name, json);
    }

    fn add_annotation(&self, image_name: &str, json: &str) {
        fs::write(
            self.input.join("ann").join(format!("{}.json", image_name)),
            json,
        )
        .unwrap();
    }

    fn add_other(&self, name: &str) {
        fs::write(self.input.join("img").join(name), b"not an image").unwrap();
    }

    fn config(&self) -> ConversionConfig {
        ConversionConfig::new(&self.input, &self.output)
    }

    fn zip_path(&self) -> PathBuf {
        self.output.join("my_dataset.zip")
    }
}

fn zip_entries(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
    names.sort();
    names
}

fn read_zip_entry(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[test]
fn test_convert_dataset_end_to_end() {
    let fixture = Fixture::new();
    fixture.add_png("dog.png", 100, 100, DOG_JSON);
    fixture.add_jpg(
        "cats.JPG",
        64,
        48,
        r#"{"size":{"width":64,"height":48},"objects":[
            {"classTitle":"cat","points":{"exterior":[[1.5,2.5],[10,12]]}},
            {"classTitle":"kitten","points":{"exterior":[[20,20],[30.5,40]]}}
        ]}"#,
    );

    let stats = convert_dataset(&fixture.config()).unwrap();

    assert_eq!(stats.images_found, 2);
    assert_eq!(stats.images_converted, 2);
    assert_eq!(stats.objects_written, 3);
    assert_eq!(stats.failed_conversions, 0);

    let zip_path = fixture.zip_path();
    assert_eq!(
        zip_entries(&zip_path),
        vec![
            "Annotations/cats.xml",
            "Annotations/dog.xml",
            "JPEGImages/cats.jpg",
            "JPEGImages/dog.jpg",
        ]
    );

    let dog = from_xml_str(&read_zip_entry(&zip_path, "Annotations/dog.xml")).unwrap();
    assert_eq!(dog.folder, "JPEGImages");
    assert_eq!(dog.filename, "dog.jpg");
    assert!(dog.path.ends_with("dog.jpg"));
    assert_eq!((dog.size.width, dog.size.height, dog.size.depth), (100, 100, 3));
    assert_eq!(dog.segmented, 0);
    assert_eq!(dog.objects.len(), 1);
    assert_eq!(dog.objects[0].name, "dog");
    let b = dog.objects[0].bndbox;
    assert_eq!((b.xmin, b.ymin, b.xmax, b.ymax), (5, 5, 15, 25));

    let cats = from_xml_str(&read_zip_entry(&zip_path, "Annotations/cats.xml")).unwrap();
    assert_eq!((cats.size.width, cats.size.height), (64, 48));
    let names: Vec<_> = cats.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["cat", "kitten"]);
    let b = cats.objects[0].bndbox;
    assert_eq!((b.xmin, b.ymin, b.xmax, b.ymax), (2, 2, 10, 12));
    assert_eq!(cats.objects[1].bndbox.xmax, 30);

    // Staging directories are removed, the input is kept
    assert!(!fixture.output.join("JPEGImages").exists());
    assert!(!fixture.output.join("Annotations").exists());
    assert!(fixture.input.exists());
}

#[test]
fn test_unsupported_extensions_are_not_counted() {
    let fixture = Fixture::new();
    fixture.add_png("dog.png", 100, 100, DOG_JSON);
    fixture.add_other("notes.txt");
    fixture.add_other("anim.gif");
    fixture.add_other("photo.jpeg");

    let stats = convert_dataset(&fixture.config()).unwrap();

    assert_eq!(stats.images_found, 1);
    assert_eq!(stats.images_converted, 1);
    assert_eq!(stats.skipped_unsupported, 3);
    assert_eq!(zip_entries(&fixture.zip_path()).len(), 2);
}

#[test]
fn test_collect_images_filters_and_sorts() {
    let fixture = Fixture::new();
    for name in ["b.png", "a.JPG", "c.PNG", "d.jpeg", "e.Png", "f"] {
        fixture.add_other(name);
    }
    fs::create_dir(fixture.input.join("img").join("nested.png")).unwrap();

    let (images, skipped) = collect_images(&fixture.input.join("img"), &fixture.config()).unwrap();
    let names: Vec<_> = images
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, ["a.JPG", "b.png", "c.PNG"]);
    assert_eq!(skipped, 3);
}

#[test]
fn test_collect_images_honors_configured_extensions() {
    let fixture = Fixture::new();
    fixture.add_other("a.jpeg");
    fixture.add_other("b.png");

    let mut config = fixture.config();
    config.extensions = vec!["jpeg".to_string()];
    let (images, skipped) = collect_images(&fixture.input.join("img"), &config).unwrap();

    assert_eq!(images.len(), 1);
    assert!(images[0].ends_with("a.jpeg"));
    assert_eq!(skipped, 1);
}

#[test]
fn test_missing_image_directory() {
    let temp = tempfile::tempdir().unwrap();
    let config = ConversionConfig::new(temp.path(), temp.path().join("out"));

    assert!(matches!(
        convert_dataset(&config),
        Err(ConvertError::Io { .. })
    ));
}

#[test]
fn test_fail_fast_leaves_no_archive() {
    let fixture = Fixture::new();
    fixture.add_png("a_good.png", 20, 20, DOG_JSON);
    fixture.add_png(
        "b_bad.png",
        20,
        20,
        r#"{"objects":[{"classTitle":"dog","points":{"exterior":[[5,5]]}}]}"#,
    );

    let err = convert_dataset(&fixture.config()).unwrap_err();

    match &err {
        ConvertError::Item { image, .. } => assert_eq!(image, "b_bad.png"),
        other => panic!("expected Item error, got {:?}", other),
    }
    assert!(matches!(err.root(), ConvertError::MalformedInput { .. }));
    assert!(!fixture.zip_path().exists());
    assert!(!fixture.output.join("my_dataset.zip.partial").exists());
    assert!(!fixture.output.join("Annotations").join("b_bad.xml").exists());
    assert!(!fixture.output.join("JPEGImages").join("b_bad.jpg").exists());
}

#[test]
fn test_skip_invalid_continues_batch() {
    let fixture = Fixture::new();
    fixture.add_png("a_good.png", 20, 20, DOG_JSON);
    fixture.add_png("b_bad.png", 20, 20, r#"{"objects":[{"classTitle":"dog"}]}"#);
    RgbImage::new(8, 8)
        .save(fixture.input.join("img").join("c_no_ann.png"))
        .unwrap();

    let mut config = fixture.config();
    config.skip_invalid = true;
    let stats = convert_dataset(&config).unwrap();

    assert_eq!(stats.images_found, 3);
    assert_eq!(stats.images_converted, 1);
    assert_eq!(stats.failed_conversions, 2);
    assert_eq!(
        zip_entries(&fixture.zip_path()),
        vec!["Annotations/a_good.xml", "JPEGImages/a_good.jpg"]
    );
}

#[test]
fn test_cleanup_removes_input() {
    let fixture = Fixture::new();
    fixture.add_png("dog.png", 10, 10, DOG_JSON);

    let mut config = fixture.config();
    config.cleanup = true;
    convert_dataset(&config).unwrap();

    assert!(fixture.zip_path().exists());
    assert!(!fixture.input.exists());
}

#[test]
fn test_process_image_writes_outputs() {
    let fixture = Fixture::new();
    fixture.add_jpg("photo.jpg", 32, 16, DOG_JSON);
    let output_dirs = setup_output_directories(&fixture.output).unwrap();

    let objects = process_image(
        &fixture.input.join("img").join("photo.jpg"),
        &fixture.config(),
        &output_dirs,
    )
    .unwrap();

    assert_eq!(objects, 1);
    let xml = fs::read_to_string(output_dirs.annotations_dir.join("photo.xml")).unwrap();
    let doc = from_xml_str(&xml).unwrap();
    assert_eq!((doc.size.width, doc.size.height), (32, 16));
    assert_eq!(
        doc.path,
        output_dirs.images_dir.join("photo.jpg").to_string_lossy()
    );
    assert!(output_dirs.images_dir.join("photo.jpg").exists());
}

#[test]
fn test_annotation_path_keeps_image_extension() {
    let path = annotation_path(Path::new("data"), Path::new("data/img/frame 01.PNG"));
    assert_eq!(path, Path::new("data").join("ann").join("frame 01.PNG.json"));
}

#[test]
fn test_convert_image_to_jpeg() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("alpha.png");
    let target = temp.path().join("alpha.jpg");
    RgbaImage::from_pixel(7, 5, Rgba([0, 0, 255, 0]))
        .save(&source)
        .unwrap();

    let dims = convert_image(&source, &target, 90).unwrap();

    assert_eq!((dims.width, dims.height), (7, 5));
    assert_eq!(
        image::ImageFormat::from_path(&target).unwrap(),
        image::ImageFormat::Jpeg
    );
    let decoded = image::open(&target).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (7, 5));
}

#[test]
fn test_source_format_rejects_unsupported() {
    assert!(source_format(Path::new("a.png")).is_ok());
    assert!(source_format(Path::new("a.JPG")).is_ok());
    assert!(matches!(
        source_format(Path::new("a.gif")),
        Err(ConvertError::UnsupportedImageFormat { .. })
    ));
    assert!(source_format(Path::new("a")).is_err());
}

#[test]
fn test_archive_outputs_layout() {
    let temp = tempfile::tempdir().unwrap();
    let staging = temp.path();
    fs::create_dir_all(staging.join("JPEGImages")).unwrap();
    fs::create_dir_all(staging.join("Annotations")).unwrap();
    fs::write(staging.join("JPEGImages").join("x.jpg"), b"jpg").unwrap();
    fs::write(staging.join("Annotations").join("x.xml"), b"<annotation/>").unwrap();
    let zip_path = staging.join("set.zip");

    let count = archive_outputs(staging, &zip_path).unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        zip_entries(&zip_path),
        vec!["Annotations/x.xml", "JPEGImages/x.jpg"]
    );
    assert_eq!(read_zip_entry(&zip_path, "Annotations/x.xml"), "<annotation/>");
    assert!(!staging.join("set.zip.partial").exists());
}

#[test]
fn test_output_names_keep_source_stem() {
    let fixture = Fixture::new();
    fixture.add_png("a:b.png", 10, 10, DOG_JSON);
    fixture.add_png("ab.png", 12, 12, DOG_JSON);
    fixture.add_png("?.png", 14, 14, DOG_JSON);

    let stats = convert_dataset(&fixture.config()).unwrap();

    assert_eq!(stats.images_found, 3);
    assert_eq!(stats.images_converted, 3);
    assert_eq!(
        zip_entries(&fixture.zip_path()),
        vec![
            "Annotations/?.xml",
            "Annotations/a:b.xml",
            "Annotations/ab.xml",
            "JPEGImages/?.jpg",
            "JPEGImages/a:b.jpg",
            "JPEGImages/ab.jpg",
        ]
    );
    let colon = from_xml_str(&read_zip_entry(&fixture.zip_path(), "Annotations/a:b.xml")).unwrap();
    assert_eq!(colon.filename, "a:b.jpg");
    assert_eq!(colon.size.width, 10);
}

#[test]
fn test_same_stem_fails_instead_of_overwriting() {
    let fixture = Fixture::new();
    fixture.add_jpg("a.jpg", 10, 10, DOG_JSON);
    fixture.add_png("a.png", 20, 20, DOG_JSON);

    let err = convert_dataset(&fixture.config()).unwrap_err();

    match &err {
        ConvertError::Item { image, source } => {
            assert_eq!(image, "a.png");
            assert!(matches!(
                source.as_ref(),
                ConvertError::DuplicateOutput { name, first } if name == "a" && first == "a.jpg"
            ));
        }
        other => panic!("expected Item error, got {:?}", other),
    }
    assert!(!fixture.zip_path().exists());
}

#[test]
fn test_skip_invalid_keeps_first_image_on_same_stem() {
    let fixture = Fixture::new();
    fixture.add_jpg("a.jpg", 10, 10, DOG_JSON);
    fixture.add_png("a.png", 20, 20, DOG_JSON);

    let mut config = fixture.config();
    config.skip_invalid = true;
    let stats = convert_dataset(&config).unwrap();

    assert_eq!(stats.images_converted, 1);
    assert_eq!(stats.failed_conversions, 1);
    let doc = from_xml_str(&read_zip_entry(&fixture.zip_path(), "Annotations/a.xml")).unwrap();
    assert_eq!((doc.size.width, doc.size.height), (10, 10));
}

#[test]
fn test_skip_invalid_frees_stem_of_failed_image() {
    let fixture = Fixture::new();
    fixture.add_jpg(
        "a.jpg",
        10,
        10,
        r#"{"objects":[{"classTitle":"dog","points":{"exterior":[]}}]}"#,
    );
    fixture.add_png("a.png", 20, 20, DOG_JSON);

    let mut config = fixture.config();
    config.skip_invalid = true;
    let stats = convert_dataset(&config).unwrap();

    assert_eq!(stats.images_converted, 1);
    assert_eq!(stats.failed_conversions, 1);
    let doc = from_xml_str(&read_zip_entry(&fixture.zip_path(), "Annotations/a.xml")).unwrap();
    assert_eq!((doc.size.width, doc.size.height), (20, 20));
}

#[test]
fn test_convert_image_follows_content_not_extension() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("scraped.jpg");
    let target = temp.path().join("out.jpg");
    RgbImage::from_pixel(9, 4, Rgb([1, 2, 3]))
        .save_with_format(&source, image::ImageFormat::Png)
        .unwrap();

    let dims = convert_image(&source, &target, 75).unwrap();

    assert_eq!((dims.width, dims.height), (9, 4));
    assert_eq!(
        image::ImageReader::open(&target)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format(),
        Some(image::ImageFormat::Jpeg)
    );
}
