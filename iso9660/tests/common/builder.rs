use crate::common::MemoryBlockDevice;
use iso9660::{write_image, IsoDirectory, IsoImage, IsoOptions};

/// Collects files and lays them out with the crate's own writer
pub struct IsoBuilder {
    root: IsoDirectory,
    options: IsoOptions,
}

impl IsoBuilder {
    pub fn new() -> Self {
        Self {
            root: IsoDirectory::new(),
            options: IsoOptions {
                volume_id: "TEST".to_string(),
                ..IsoOptions::default()
            },
        }
    }

    pub fn add_file(&mut self, path: &str, content: &[u8]) {
        self.root
            .insert_file(path, content.to_vec())
            .expect("valid test path");
    }

    pub fn add_dir(&mut self, path: &str) {
        self.root.create_directory(path).expect("valid test path");
    }

    pub fn options(&mut self) -> &mut IsoOptions {
        &mut self.options
    }

    pub fn image(&self) -> IsoImage {
        write_image(&self.root, &self.options).expect("image should build")
    }

    pub fn build(self) -> MemoryBlockDevice {
        MemoryBlockDevice::new(self.image().data)
    }
}
