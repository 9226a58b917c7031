//! Reorganize a CelebAMask-HQ download into Stellar identity folders.
//!
//! Expected input under the dataset dir: `image.zip`,
//! `mask/CelebAMask-HQ-mask-color-palette.zip`, `identity/identity_CelebA-HQ.txt`
//! and the two tables under `classification_label/`. The image list names the
//! CelebA-HQ images that belong to Stellar and their split.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use data_contracts::AttributesRecord;
use tracing::info;

use super::fs_ops::{
    ensure_dataset_dir, remove_dir_if_exists, remove_file_if_exists, renames, write_pretty_json,
};

/// Where the color-palette archive unpacks its masks, relative to `masks_r/colorized_r`.
pub const MASK_ARCHIVE_PREFIX: &str = concat!(
    "mnt/lustre/share/zqhuang/datasets_face/",
    "Face-Diffusion-raw-datasets/CelebA-Dialog-combined/",
    "mask/CelebAMask-HQ-mask-color-palette"
);

const IMAGE_ARCHIVE: &str = "image.zip";
const MASK_ARCHIVE: &str = "mask/CelebAMask-HQ-mask-color-palette.zip";
const MAPPING_FILE: &str = "CelebA-HQ-to-CelebA-mapping.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub identities: usize,
    pub images: usize,
}

/// Column labels plus one row of integer labels per kept image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    pub labels: Vec<String>,
    pub rows: BTreeMap<u32, Vec<i64>>,
}

impl AttributeTable {
    fn record(&self, image: u32) -> Result<BTreeMap<String, i64>> {
        let row = self
            .rows
            .get(&image)
            .ok_or_else(|| anyhow!("no attribute row for image {image}"))?;
        Ok(self.labels.iter().cloned().zip(row.iter().copied()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGroup {
    pub identity: u64,
    /// CelebA-HQ image numbers, in annotation-file order.
    pub images: Vec<u32>,
    /// Split of the group's first image.
    pub split: String,
}

/// `12.jpg` → 12.
fn image_number(name: &str) -> Result<u32> {
    let stem = name.split('.').next().unwrap_or(name);
    stem.trim()
        .parse::<u32>()
        .with_context(|| format!("bad image name `{name}`"))
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.trim_matches('\n').split('\n')
}

/// `filename,split` rows after a header line.
pub fn parse_image_list(text: &str) -> Result<BTreeMap<u32, String>> {
    let mut out = BTreeMap::new();
    for line in lines(text).skip(1) {
        let mut cols = line.trim_end_matches('\r').split(',');
        let name = cols.next().unwrap_or_default();
        let split = cols
            .next()
            .with_context(|| format!("image list row `{line}` has no split"))?;
        out.insert(image_number(name)?, split.to_string());
    }
    Ok(out)
}

/// Count line, whitespace-separated label line, then `name v1 v2 ...` rows.
pub fn parse_attribute_table(
    text: &str,
    keep: &BTreeMap<u32, String>,
) -> Result<AttributeTable> {
    let mut it = lines(text).skip(1);
    let labels = it
        .next()
        .context("attribute table has no label line")?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let mut rows = BTreeMap::new();
    for line in it {
        let mut cols = line.split_whitespace();
        let Some(name) = cols.next() else { continue };
        let image = image_number(name)?;
        if !keep.contains_key(&image) {
            continue;
        }
        let values = cols
            .map(|v| v.parse::<i64>().with_context(|| format!("bad label `{v}` for {name}")))
            .collect::<Result<Vec<_>>>()?;
        rows.insert(image, values);
    }
    Ok(AttributeTable { labels, rows })
}

/// Tab-separated table whose header row starts with the filename column.
pub fn parse_finegrained_table(
    text: &str,
    keep: &BTreeMap<u32, String>,
) -> Result<AttributeTable> {
    let mut it = lines(text).map(|l| l.trim_end_matches('\r').trim_matches('\t'));
    let labels = it
        .next()
        .context("fine-grained table is empty")?
        .split('\t')
        .skip(1)
        .map(str::to_string)
        .collect();
    let mut rows = BTreeMap::new();
    for line in it {
        let mut cols = line.split('\t');
        let Some(name) = cols.next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let image = image_number(name)?;
        if !keep.contains_key(&image) {
            continue;
        }
        let values = cols
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .with_context(|| format!("bad level `{v}` for {name}"))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.insert(image, values);
    }
    Ok(AttributeTable { labels, rows })
}

/// `name identity` rows, kept images only, in file order.
pub fn parse_identity_table(
    text: &str,
    keep: &BTreeMap<u32, String>,
) -> Result<Vec<(u32, u64)>> {
    let mut out = Vec::new();
    for line in lines(text) {
        let mut cols = line.split_whitespace();
        let (Some(name), Some(identity)) = (cols.next(), cols.next()) else {
            continue;
        };
        let image = image_number(name)?;
        if !keep.contains_key(&image) {
            continue;
        }
        let identity = identity
            .parse::<u64>()
            .with_context(|| format!("bad identity `{identity}` for {name}"))?;
        out.push((image, identity));
    }
    Ok(out)
}

/// Group images by identity and order the groups by (split, identity).
pub fn group_identities(
    identities: &[(u32, u64)],
    splits: &BTreeMap<u32, String>,
) -> Result<Vec<IdentityGroup>> {
    let mut by_identity: BTreeMap<u64, Vec<u32>> = BTreeMap::new();
    for &(image, identity) in identities {
        by_identity.entry(identity).or_default().push(image);
    }
    let mut groups = by_identity
        .into_iter()
        .map(|(identity, images)| -> Result<IdentityGroup> {
            let split = splits
                .get(&images[0])
                .cloned()
                .with_context(|| format!("image {} missing from the image list", images[0]))?;
            Ok(IdentityGroup {
                identity,
                images,
                split,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    groups.sort_by(|a, b| (&a.split, a.identity).cmp(&(&b.split, b.identity)));
    Ok(groups)
}

fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    info!(archive = %archive.display(), dest = %dest.display(), "unzipping");
    let file =
        fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip =
        zip::ZipArchive::new(file).with_context(|| format!("read {}", archive.display()))?;
    zip.extract(dest)
        .with_context(|| format!("extract {}", archive.display()))?;
    fs::remove_file(archive).with_context(|| format!("remove {}", archive.display()))?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Unpack archives and move the raw download into `annotations/`, `images/`, `masks/`.
fn stage_download(dir: &Path) -> Result<()> {
    if dir.join(IMAGE_ARCHIVE).exists() {
        for (archive, dest) in [
            (dir.join(IMAGE_ARCHIVE), dir.join("images_r")),
            (dir.join(MASK_ARCHIVE), dir.join("masks_r/colorized_r")),
        ] {
            if !dest.exists() {
                unzip(&archive, &dest)?;
            }
        }
    }
    remove_dir_if_exists(&dir.join("mask"))?;

    let identity_table = dir.join("identity/identity_CelebA-HQ.txt");
    if identity_table.exists() {
        let annotations = dir.join("annotations");
        fs::create_dir_all(&annotations)?;
        renames(&identity_table, &annotations.join("identity.txt"), dir)?;
        renames(
            &dir.join("classification_label/CelebAMask-HQ-attribute-anno.txt"),
            &annotations.join("attributes.txt"),
            dir,
        )?;
        renames(
            &dir.join("classification_label/combined_annotation_hq.txt"),
            &annotations.join("attributes_finegrained.txt"),
            dir,
        )?;
        renames(&dir.join("images_r/image"), &dir.join("images"), dir)?;
        renames(
            &dir.join("masks_r/colorized_r").join(MASK_ARCHIVE_PREFIX),
            &dir.join("masks"),
            dir,
        )?;
    }
    remove_dir_if_exists(&dir.join("text"))?;
    Ok(())
}

/// Reorganize `dataset_dir` in place. Returns an empty report when the
/// annotations were already consumed by an earlier run.
pub fn extract_stellar(dataset_dir: &Path, image_list: &Path) -> Result<ExtractReport> {
    ensure_dataset_dir(dataset_dir)?;
    stage_download(dataset_dir)?;

    let splits = parse_image_list(&read_text(image_list)?)?;
    let annotations = dataset_dir.join("annotations");
    if !annotations.exists() {
        info!("no annotations directory; nothing to reorganize");
        return Ok(ExtractReport::default());
    }

    let attributes =
        parse_attribute_table(&read_text(&annotations.join("attributes.txt"))?, &splits)?;
    let finegrained = parse_finegrained_table(
        &read_text(&annotations.join("attributes_finegrained.txt"))?,
        &splits,
    )?;
    let identities =
        parse_identity_table(&read_text(&annotations.join("identity.txt"))?, &splits)?;
    let groups = group_identities(&identities, &splits)?;
    if groups.is_empty() {
        bail!("none of the listed images appear in the identity table");
    }

    let mut report = ExtractReport::default();
    for (new_id, group) in groups.iter().enumerate() {
        let save_dir = dataset_dir.join(format!("{new_id:03}"));
        fs::create_dir_all(&save_dir)?;
        let mut records = Vec::with_capacity(group.images.len());
        for (idx, &image) in group.images.iter().enumerate() {
            renames(
                &dataset_dir.join("images").join(format!("{image}.jpg")),
                &save_dir.join(format!("{idx}.jpg")),
                dataset_dir,
            )?;
            renames(
                &dataset_dir.join("masks").join(format!("{image}.png")),
                &save_dir.join(format!("{idx}_bg.png")),
                dataset_dir,
            )?;
            records.push(AttributesRecord {
                attributes: attributes.record(image)?,
                finegrained_attributes: finegrained.record(image)?,
                identity: group.identity,
                original_filename: format!("{image}.jpg"),
            });
        }
        for (idx, record) in records.iter().enumerate() {
            write_pretty_json(&save_dir.join(format!("{idx}_attributes.json")), record)?;
        }
        report.identities += 1;
        report.images += group.images.len();
    }

    info!("deleting scratch folders (this might take a while)");
    for scratch in ["annotations", "images", "masks", "mask"] {
        remove_dir_if_exists(&dataset_dir.join(scratch))?;
    }
    remove_file_if_exists(&dataset_dir.join(MAPPING_FILE))?;
    info!(
        identities = report.identities,
        images = report.images,
        "extraction complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep(ids: &[(u32, &str)]) -> BTreeMap<u32, String> {
        ids.iter().map(|(i, s)| (*i, s.to_string())).collect()
    }

    #[test]
    fn image_list_skips_header() -> Result<()> {
        let list = parse_image_list("filename,split\n0.jpg,val\n17.jpg,test\n")?;
        assert_eq!(list, keep(&[(0, "val"), (17, "test")]));
        Ok(())
    }

    #[test]
    fn attribute_table_filters_rows() -> Result<()> {
        let text = "3\nSmiling Male\n0.jpg  1 -1\n1.jpg -1 -1\n2.jpg  1  1\n";
        let table = parse_attribute_table(text, &keep(&[(0, "val"), (2, "val")]))?;
        assert_eq!(table.labels, vec!["Smiling", "Male"]);
        assert_eq!(table.rows.len(), 2);
        let rec = table.record(2)?;
        assert_eq!(rec.get("Male"), Some(&1));
        assert!(table.record(1).is_err());
        Ok(())
    }

    #[test]
    fn finegrained_table_is_tab_separated() -> Result<()> {
        let text = "File\tBangs\tSmiling\t\n0.jpg\t0\t3\t\n5.jpg\t2\t1\t\n";
        let table = parse_finegrained_table(text, &keep(&[(5, "test")]))?;
        assert_eq!(table.labels, vec!["Bangs", "Smiling"]);
        assert_eq!(table.rows.get(&5), Some(&vec![2, 1]));
        Ok(())
    }

    #[test]
    fn groups_sort_by_split_then_identity() -> Result<()> {
        let splits = keep(&[(0, "val"), (1, "test"), (2, "val"), (3, "val")]);
        let table = "0.jpg 77\n1.jpg 12\n2.jpg 77\n3.jpg 40\n4.jpg 12\n";
        let identities = parse_identity_table(table, &splits)?;
        let groups = group_identities(&identities, &splits)?;
        let order: Vec<u64> = groups.iter().map(|g| g.identity).collect();
        assert_eq!(order, vec![12, 40, 77]);
        assert_eq!(groups[2].images, vec![0, 2]);
        assert_eq!(groups[0].split, "test");
        Ok(())
    }
}
